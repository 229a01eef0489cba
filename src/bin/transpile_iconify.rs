//! transpile-iconify - SVG directories to Iconify JSON
//!
//! Exit codes: 0 success, 1 configuration failure, 2 icon set failure.

use clap::Parser;
use std::process::ExitCode;

use iconify_transpile::cli::{self, Cli, Error};
use iconify_transpile::output::FsSink;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log = cli::init_tracing(cli.debug);

    match cli::run(&cli, &mut FsSink, Some(&log)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(Error::Config(err)) => {
            tracing::error!("Error loading configuration file: {}", cli.config.display());
            tracing::error!("{}", err);
            tracing::debug!(error = ?err, "Error details");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::from(2)
        }
    }
}
