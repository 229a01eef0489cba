//! Command-line surface shared by the binary and tests.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use crate::config::{self, ConfigError, IconSetJob, DEFAULT_CONFIG_FILE};
use crate::output::OutputSink;
use crate::pipeline::{run_batch, JobReport, PipelineError};

#[derive(Parser, Debug)]
#[command(name = "transpile-iconify")]
#[command(version, about = "Transform SVG files into JSON format for Iconify")]
pub struct Cli {
    /// Configuration file path
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable debug mode for verbose logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration loading failed: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Handle for raising the log level after startup.
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogControl {
    pub fn enable_debug(&self) {
        if let Err(e) = self.handle.modify(|filter| *filter = EnvFilter::new("debug")) {
            tracing::warn!(error = %e, "Could not raise log level");
        }
    }
}

/// Install the fmt subscriber. `RUST_LOG` applies unless `--debug` is set.
pub fn init_tracing(debug: bool) -> LogControl {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let (filter, handle) = reload::Layer::new(filter);
    // a subscriber may already be installed (tests)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
    LogControl { handle }
}

impl Cli {
    /// Config path resolved against the working directory.
    pub fn config_path(&self) -> Result<PathBuf, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
            path: self.config.clone(),
            source,
        })?;
        Ok(cwd.join(&self.config))
    }

    pub fn load_jobs(&self) -> Result<Vec<IconSetJob>, ConfigError> {
        let path = self.config_path()?;
        debug_log!(self.debug, "Debug mode: enabled");
        debug_log!(self.debug, path = %path.display(), "Config path");
        config::load_jobs(&path, self.debug)
    }
}

/// Load the config and run every job in order.
pub fn run(
    cli: &Cli,
    sink: &mut dyn OutputSink,
    log: Option<&LogControl>,
) -> Result<Vec<JobReport>, Error> {
    let jobs = cli.load_jobs()?;
    if let Some(log) = log.filter(|_| jobs.iter().any(|j| j.debug_enabled)) {
        log.enable_debug();
    }

    debug_log!(cli.debug, count = jobs.len(), "Processing icon sets");
    let reports = run_batch(&jobs, sink)?;
    tracing::info!("All icon sets processed successfully!");
    Ok(reports)
}
