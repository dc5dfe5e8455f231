//! Read-on-read error correction of long sequencing reads via partial-order
//! consensus over M5 pairwise alignments.
//!
//! See `DESIGN.md` for the module-by-module grounding ledger.

pub mod alignment;
pub mod cli;
pub mod dag;
pub mod error;
pub mod logging;
pub mod m5;
pub mod normalize;
pub mod pipeline;
pub mod realign;
pub mod record;
pub mod trim;
