//! Icon Set Pipeline - one job from source directory to JSON file
//!
//! Per-icon failures remove that icon and never escape the job.
//! Directory and write failures are fatal to the job and halt the batch.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::IconSetJob;
use crate::icon_set::{EntryKind, IconSetBuilder, LoadError};
use crate::normalize::{NormalizeError, NormalizeOptions, NormalizeStep, Normalizer};
use crate::output::{write_icon_set, OutputError, OutputSink};
use crate::svg::SvgDocument;
use crate::validation::{ValidationAction, Validator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read source directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("no SVG files found in {0}")]
    NoIcons(PathBuf),

    #[error("failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<LoadError> for PipelineError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::DirectoryRead { path, source } => PipelineError::DirectoryRead { path, source },
            LoadError::NoSvgFiles { path } => PipelineError::NoIcons(path),
        }
    }
}

impl From<OutputError> for PipelineError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Serialization(e) => PipelineError::Serialization(e),
            OutputError::Write { path, source } => PipelineError::OutputWrite { path, source },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Loading,
    Processing,
    Exporting,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobState::Pending => "pending",
            JobState::Loading => "loading",
            JobState::Processing => "processing",
            JobState::Exporting => "exporting",
            JobState::Writing => "writing",
            JobState::Done => "done",
            JobState::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemovalReason {
    /// The icon could not be read or parsed.
    Unusable(String),
    SizeMismatch(String),
    Normalize { step: NormalizeStep, message: String },
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalReason::Unusable(message) => write!(f, "invalid SVG: {}", message),
            RemovalReason::SizeMismatch(message) => write!(f, "unexpected dimensions: {}", message),
            RemovalReason::Normalize { step, message } => write!(f, "{} failed: {}", step, message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemovedIcon {
    pub name: String,
    pub reason: RemovalReason,
}

/// What one job did. Every removal is listed exactly once.
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    pub prefix: String,
    pub target: PathBuf,
    pub bytes_written: usize,
    pub icons: Vec<String>,
    pub aliases: Vec<String>,
    pub removed: Vec<RemovedIcon>,
    pub size_warnings: Vec<String>,
}

impl JobReport {
    pub fn removed_names(&self) -> Vec<&str> {
        self.removed.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Runs one icon set job.
pub struct IconSetPipeline {
    job: IconSetJob,
    validator: Validator,
    normalizer: Normalizer,
}

impl IconSetPipeline {
    pub fn new(job: IconSetJob) -> Self {
        let validator = Validator::new(job.expected_size, job.skip_size_validation)
            .with_policy(job.size_mismatch);
        let normalizer = Normalizer::new(NormalizeOptions {
            precision: job.precision,
            keep_palette: job.info.as_ref().map_or(false, |i| i.is_palette()),
        });
        Self {
            job,
            validator,
            normalizer,
        }
    }

    fn debug(&self) -> bool {
        self.job.debug_enabled
    }

    fn enter(&self, state: JobState) {
        debug_log!(self.debug(), prefix = %self.job.prefix, state = %state, "Job state");
    }

    /// Import the source directory and attach metadata and aliases.
    pub fn load(&self) -> Result<IconSetBuilder, PipelineError> {
        let job = &self.job;
        debug_log!(self.debug(), dir = %job.source_dir.display(), "Source directory");
        debug_log!(self.debug(), file = %job.target_file.display(), "Target file");
        debug_log!(self.debug(), expected = ?job.expected_size, "Expected size");

        let mut builder = IconSetBuilder::load(&job.source_dir, &job.prefix)?;

        let mut count = 0;
        builder.for_each_entry(|_, _, _| count += 1);
        debug_log!(self.debug(), count, "Imported icons from directory");

        if let Some(info) = &job.info {
            builder.set_info(info.clone());
            debug_log!(self.debug(), info = ?info, "Set icon set info");
        }
        for (alias, parent) in &job.aliases {
            builder.add_alias(alias, parent);
        }
        Ok(builder)
    }

    /// Validate and normalize every icon entry in place.
    pub fn process(&self, builder: &mut IconSetBuilder, report: &mut JobReport) {
        builder.for_each_entry(|set, name, kind| {
            debug_log!(self.debug(), icon = name, kind = %kind, "Processing icon");
            if kind != EntryKind::Icon {
                debug_log!(self.debug(), icon = name, "Skipping non-icon");
                return;
            }

            let document = set.get_icon(name).cloned();
            let outcome = self.validator.validate(document.as_ref());
            let Some(mut svg) = document else {
                let message = set.load_error(name).unwrap_or("missing").to_string();
                tracing::warn!(prefix = %self.job.prefix, icon = name, "Invalid SVG for icon, removing");
                debug_log!(self.debug(), icon = name, error = %message, "Load error");
                set.remove_icon(name);
                report.removed.push(RemovedIcon {
                    name: name.to_string(),
                    reason: RemovalReason::Unusable(message),
                });
                return;
            };

            debug_log!(
                self.debug(),
                icon = name,
                width = svg.width(),
                height = svg.height(),
                "Icon dimensions"
            );
            match self.validator.action(&outcome) {
                ValidationAction::Keep => {}
                ValidationAction::KeepWithWarning => {
                    tracing::warn!(
                        prefix = %self.job.prefix,
                        icon = name,
                        "Icon has unexpected dimensions: {} x {}",
                        svg.width(),
                        svg.height()
                    );
                    debug_log!(self.debug(), icon = name, "{}", outcome);
                    report.size_warnings.push(name.to_string());
                }
                ValidationAction::Remove => {
                    tracing::warn!(prefix = %self.job.prefix, icon = name, "{}, removing", outcome);
                    set.remove_icon(name);
                    report.removed.push(RemovedIcon {
                        name: name.to_string(),
                        reason: RemovalReason::SizeMismatch(outcome.to_string()),
                    });
                    return;
                }
            }

            if let Err(err) = self.normalize(name, &mut svg) {
                tracing::error!(
                    prefix = %self.job.prefix,
                    icon = name,
                    step = %err.step(),
                    "Error parsing icon: {}",
                    err
                );
                set.remove_icon(name);
                report.removed.push(RemovedIcon {
                    name: name.to_string(),
                    reason: RemovalReason::Normalize {
                        step: err.step(),
                        message: err.to_string(),
                    },
                });
                return;
            }

            set.put_icon(name, svg);
            debug_log!(self.debug(), icon = name, "Successfully processed icon");
        });
    }

    fn normalize(&self, name: &str, svg: &mut SvgDocument) -> Result<(), NormalizeError> {
        let debug = self.debug();

        debug_log!(debug, icon = name, "Cleaning up SVG");
        self.normalizer.cleanup(svg)?;

        debug_log!(debug, icon = name, "Parsing colors");
        self.normalizer.rewrite_colors(svg, |attr, from, to| {
            debug_log!(debug, icon = name, attr, "Color parsing: {} -> {}", from, to);
        });

        debug_log!(debug, icon = name, "Running optimization");
        self.normalizer.optimize(svg)
    }

    /// Load, process, export and write. Returns the job report.
    pub fn run(&self, sink: &mut dyn OutputSink) -> Result<JobReport, PipelineError> {
        tracing::info!("Processing icon set: {}", self.job.prefix);
        self.enter(JobState::Pending);

        let result = self.run_states(sink);
        match &result {
            Ok(report) => {
                self.enter(JobState::Done);
                tracing::info!(
                    "Saved {} ({} bytes)",
                    report.target.display(),
                    report.bytes_written
                );
            }
            Err(err) => {
                self.enter(JobState::Failed);
                debug_log!(self.debug(), error = ?err, "Error details");
            }
        }
        result
    }

    fn run_states(&self, sink: &mut dyn OutputSink) -> Result<JobReport, PipelineError> {
        let mut report = JobReport {
            prefix: self.job.prefix.clone(),
            target: self.job.target_file.clone(),
            ..JobReport::default()
        };

        self.enter(JobState::Loading);
        let mut builder = self.load()?;

        self.enter(JobState::Processing);
        self.process(&mut builder, &mut report);

        self.enter(JobState::Exporting);
        let set = builder.export();
        report.icons = set.icons.keys().cloned().collect();
        report.aliases = set.aliases.keys().cloned().collect();

        self.enter(JobState::Writing);
        debug_log!(self.debug(), path = %self.job.target_file.display(), "Writing output");
        report.bytes_written = write_icon_set(sink, &self.job.target_file, &set)?;
        debug_log!(self.debug(), bytes = report.bytes_written, "JSON output size");

        Ok(report)
    }
}

/// Run jobs strictly in order. The first fatal job error stops the batch.
pub fn run_batch(
    jobs: &[IconSetJob],
    sink: &mut dyn OutputSink,
) -> Result<Vec<JobReport>, PipelineError> {
    let mut reports = Vec::with_capacity(jobs.len());
    for job in jobs {
        let pipeline = IconSetPipeline::new(job.clone());
        match pipeline.run(sink) {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!(prefix = %job.prefix, "Icon set failed: {}", err);
                return Err(err);
            }
        }
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::FsSink;
    use crate::validation::{ExpectedSize, SizeMismatchPolicy};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn icon(size: u32, body: &str) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {0} {0}">{1}</svg>"#,
            size, body
        )
    }

    fn source_dir(files: &[(&str, String)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn job(source: &Path, target: PathBuf) -> IconSetJob {
        let mut job = IconSetJob::new(source, target, "test");
        job.expected_size = Some(ExpectedSize::Square(24));
        job
    }

    #[test]
    fn test_mismatch_kept_with_warning() {
        let src = source_dir(&[("small.svg", icon(16, r#"<path d="M0 0h16v16H0z"/>"#))]);
        let out = TempDir::new().unwrap();
        let report = IconSetPipeline::new(job(src.path(), out.path().join("set.json")))
            .run(&mut FsSink)
            .unwrap();
        assert_eq!(report.icons, vec!["small"]);
        assert_eq!(report.size_warnings, vec!["small"]);
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_mismatch_removed_under_strict_policy() {
        let src = source_dir(&[("small.svg", icon(16, r#"<path d="M0 0h16v16H0z"/>"#))]);
        let out = TempDir::new().unwrap();
        let mut job = job(src.path(), out.path().join("set.json"));
        job.size_mismatch = SizeMismatchPolicy::Remove;
        let report = IconSetPipeline::new(job).run(&mut FsSink).unwrap();
        assert!(report.icons.is_empty());
        assert!(matches!(report.removed[0].reason, RemovalReason::SizeMismatch(_)));
    }

    #[test]
    fn test_aliases_skip_processing_and_export() {
        let src = source_dir(&[("home.svg", icon(24, r#"<path d="M0 0h24v24H0z"/>"#))]);
        let out = TempDir::new().unwrap();
        let mut job = job(src.path(), out.path().join("set.json"));
        job.aliases.insert("house".to_string(), "home".to_string());
        job.aliases.insert("orphan".to_string(), "missing".to_string());

        let report = IconSetPipeline::new(job).run(&mut FsSink).unwrap();
        assert_eq!(report.aliases, vec!["house"]);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.path().join("set.json")).unwrap())
                .unwrap();
        assert_eq!(json["aliases"]["house"]["parent"], "home");
    }

    #[test]
    fn test_palette_sets_keep_colors() {
        let src = source_dir(&[(
            "flag.svg",
            icon(24, r##"<path fill="#c00" d="M0 0h24v12H0z"/>"##),
        )]);
        let out = TempDir::new().unwrap();
        let mut job = job(src.path(), out.path().join("set.json"));
        job.info = Some(serde_json::from_str(r#"{"name": "Flags", "palette": true}"#).unwrap());
        IconSetPipeline::new(job).run(&mut FsSink).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.path().join("set.json")).unwrap())
                .unwrap();
        assert_eq!(json["icons"]["flag"]["body"], r##"<path fill="#c00" d="M0 0h24v12H0z"/>"##);
        assert_eq!(json["info"]["total"], 1);
    }

    #[test]
    fn test_empty_directory_is_fatal() {
        let src = TempDir::new().unwrap();
        let err = IconSetPipeline::new(job(src.path(), src.path().join("out.json")))
            .run(&mut FsSink)
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoIcons(_)));
    }

    #[test]
    fn test_batch_halts_on_first_failure() {
        let good = source_dir(&[("a.svg", icon(24, r#"<path d="M0 0h24v24H0z"/>"#))]);
        let out = TempDir::new().unwrap();
        let jobs = vec![
            job(good.path(), out.path().join("first.json")),
            job(&good.path().join("missing"), out.path().join("second.json")),
            job(good.path(), out.path().join("third.json")),
        ];
        let err = run_batch(&jobs, &mut FsSink).unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryRead { .. }));
        assert!(out.path().join("first.json").exists());
        assert!(!out.path().join("third.json").exists());
    }
}
