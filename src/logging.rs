//! Leveled logging (spec §4.I): an `env_logger` formatter matching the
//! `{timestamp} {priority} [{category}] {message}` pattern from spec §6,
//! the Rust equivalent of the original's `log4cpp::PatternLayout`
//! `"%d %p [%c] %m%n"` (see `original_source/main.cpp` `setupLogger`).
//!
//! "Category" is the logical pipeline stage (`reader`, `consensus`,
//! `writer`, `m5`) passed via `log::warn!(target: "...", ...)` rather than
//! the Rust module path, matching the original's per-component
//! `log4cpp::Category` instances (spec §4.I).

use std::io::Write;

use log::LevelFilter;

/// Installs the crate's `env_logger` instance, writing to standard error.
/// `verbose` lowers the effective level from `info` to `debug` (spec §6
/// `--verbose`).
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} [{}] {}",
                buf.timestamp(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}
