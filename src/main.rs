use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use dagcon::cli::{Cli, Config};
use dagcon::{logging, pipeline};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::from_cli(&cli)?;
    let code = pipeline::run(cli.input, config);

    Ok(if code == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
