//! CLI surface (spec §4.H): a flat `clap`-derive argument list converted,
//! once, into the immutable [`Config`] threaded through the coordinator.

use std::path::Path;

use clap::Parser;

use crate::error::ConfigError;
use crate::realign::BandConfig;

/// Perform read-on-read error correction via partial-order consensus over
/// M5 pairwise alignments.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Input M5 alignment file, or `-` for standard input
    #[arg(default_value = "-")]
    pub input: String,

    /// Minimum coverage required to correct a target
    #[arg(short = 'c', long = "min-coverage", default_value_t = 8)]
    pub min_coverage: usize,

    /// Filter both input alignments and emitted consensus segments shorter than this
    #[arg(short = 'm', long = "min-length", default_value_t = 500)]
    pub min_length: usize,

    /// Trim alignments by this many columns on either side
    #[arg(short = 't', long = "trim", default_value_t = 50)]
    pub trim: usize,

    /// Number of consensus worker threads; omit to run single-threaded
    #[arg(short = 'j', long = "threads")]
    pub threads: Option<usize>,

    /// Size of the alignment (reader -> worker) buffer
    #[arg(short = 'r', long = "rbuf", default_value_t = 30)]
    pub rbuf: usize,

    /// Size of the consensus (worker -> writer) buffer
    #[arg(short = 'w', long = "wbuf", default_value_t = 30)]
    pub wbuf: usize,

    /// Align sequences before adding to consensus (spec §4.C)
    #[arg(short = 'a', long = "align")]
    pub align: bool,

    /// Increase logging verbosity
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// The immutable configuration value built once from [`Cli`] and passed by
/// reference into the reader, every worker, and the writer (spec §3
/// "Configuration value (ambient)"; replaces the original's process-wide
/// `fopts` global, per spec §9).
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub min_coverage: usize,
    pub min_length:   usize,
    pub trim:         usize,
    pub threads:      Option<usize>,
    pub rbuf:         usize,
    pub wbuf:         usize,
    pub align:        bool,
    pub band:         BandConfig,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        if cli.input != "-" && !Path::new(&cli.input).exists() {
            return Err(ConfigError::InputNotFound(cli.input.clone().into()));
        }
        if cli.rbuf == 0 || cli.wbuf == 0 {
            return Err(ConfigError::ZeroCapacityChannel);
        }
        if cli.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }

        Ok(Self {
            min_coverage: cli.min_coverage,
            min_length:   cli.min_length,
            trim:         cli.trim,
            threads:      cli.threads,
            rbuf:         cli.rbuf,
            wbuf:         cli.wbuf,
            align:        cli.align,
            band:         BandConfig::default(),
        })
    }

    /// Number of consensus worker threads the coordinator should spawn.
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or(1)
    }
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert()
}

#[test]
fn defaults_match_spec() {
    let cli = Cli::parse_from(["dagcon"]);
    assert_eq!(cli.input, "-");
    assert_eq!(cli.min_coverage, 8);
    assert_eq!(cli.min_length, 500);
    assert_eq!(cli.trim, 50);
    assert_eq!(cli.threads, None);
    assert_eq!(cli.rbuf, 30);
    assert_eq!(cli.wbuf, 30);
    assert!(!cli.align);
    assert!(!cli.verbose);
}

#[test]
fn rejects_zero_capacity_channels() {
    let cli = Cli::parse_from(["dagcon", "-r", "0"]);
    assert!(matches!(Config::from_cli(&cli), Err(ConfigError::ZeroCapacityChannel)));
}

#[test]
fn rejects_zero_threads() {
    let cli = Cli::parse_from(["dagcon", "-j", "0"]);
    assert!(matches!(Config::from_cli(&cli), Err(ConfigError::ZeroThreads)));
}

#[test]
fn rejects_a_missing_input_path() {
    let cli = Cli::parse_from(["dagcon", "/no/such/path/dagcon-test-fixture.m5"]);
    assert!(matches!(Config::from_cli(&cli), Err(ConfigError::InputNotFound(_))));
}

#[test]
fn accepts_stdin_without_checking_the_filesystem() {
    let cli = Cli::parse_from(["dagcon", "-"]);
    assert!(Config::from_cli(&cli).is_ok());
}
