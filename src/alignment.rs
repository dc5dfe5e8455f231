//! The [`Alignment`] record type shared by every stage of the pipeline.

use std::fmt;

pub const GAP: u8 = b'-';

/// Which strand a read mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
        })
    }
}

impl std::str::FromStr for Strand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            _ => Err(()),
        }
    }
}

/// A single pairwise alignment of a query read against a target read.
///
/// `target_aligned` and `query_aligned` always have equal length and may
/// contain [`GAP`] columns; see spec §3 for the full set of invariants.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub query_id:     String,
    pub query_len:    usize,
    pub query_start:  usize,
    pub query_end:    usize,
    pub query_strand: Strand,

    pub target_id:     String,
    pub target_len:    usize,
    pub target_start:  usize,
    pub target_end:    usize,
    pub target_strand: Strand,

    pub target_aligned: Vec<u8>,
    pub query_aligned:  Vec<u8>,
}

impl Alignment {
    /// Length of the aligned columns (with gaps). Both strings share this
    /// length by construction (see [`crate::m5::parse_line`]). This is the
    /// quantity the `min-length` filter operates on (spec §6).
    #[inline]
    pub fn aligned_len(&self) -> usize {
        self.target_aligned.len()
    }
}
