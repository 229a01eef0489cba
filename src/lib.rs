//! Iconify Transpile - SVG directories to Iconify icon set JSON
//!
//! # Pipeline
//! 1. Load every SVG under a source directory
//! 2. Validate each icon's viewport against the expected size
//! 3. Normalize: cleanup, color rewrite, optimize
//! 4. Export the surviving icons as one JSON document per job

/// `tracing::debug!` gated on a per-job flag.
macro_rules! debug_log {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            tracing::debug!($($arg)+);
        }
    };
}

pub mod svg;
pub mod path_data;
pub mod color;
pub mod normalize;
pub mod validation;
pub mod icon_set;
pub mod output;
pub mod config;
pub mod pipeline;
pub mod cli;

pub use svg::{SvgDocument, SvgError, ViewBox};
pub use normalize::{NormalizeError, NormalizeOptions, NormalizeStep, Normalizer};
pub use validation::{ExpectedSize, SizeMismatchPolicy, ValidationOutcome, Validator};
pub use icon_set::{EntryKind, IconSet, IconSetBuilder, IconSetInfo, NormalizedIcon};
pub use output::{FsSink, OutputSink};
pub use config::{ConfigError, IconSetJob, JobDescriptor};
pub use pipeline::{run_batch, IconSetPipeline, JobReport, PipelineError, RemovalReason};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
