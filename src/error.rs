//! Error types used throughout the crate.
//!
//! Two families, kept deliberately separate (see DESIGN.md): [`ConfigError`]
//! aborts the process before any pipeline thread is spawned, while
//! [`M5Error`] is consumed entirely by the reader's driver loop and never
//! propagates past it (per spec §7, a parser failure degrades to "less
//! output", not a process exit).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can prevent the pipeline from starting at all.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("rbuf and wbuf must be at least 1")]
    ZeroCapacityChannel,

    #[error("threads must be at least 1 when specified")]
    ZeroThreads,
}

/// Errors surfaced while parsing the M5 alignment stream. Only
/// [`M5Error::Open`] and [`M5Error::SortOrder`] are fatal to the stream;
/// malformed individual records are logged and dropped inline by the
/// parser and never reach this type (see [`crate::m5`]).
#[derive(Error, Debug)]
pub enum M5Error {
    #[error("failed to open input '{path}': {source}")]
    Open {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("input is not sorted: key '{key}' reappeared after the parser moved past it")]
    SortOrder { key: String },
}
