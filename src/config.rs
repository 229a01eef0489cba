//! Config Resolver - job descriptors from JSON or TOML
//!
//! A config file holds either one descriptor or a list of them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::icon_set::IconSetInfo;
use crate::normalize::DEFAULT_PRECISION;
use crate::validation::{ExpectedSize, SizeMismatchPolicy};

pub const DEFAULT_CONFIG_FILE: &str = "iconify.config.json";

const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{path} is a script config; export its data as a .json file instead")]
    ScriptConfig { path: PathBuf },

    #[error("icon set #{index}: {message}")]
    Invalid { index: usize, message: String },
}

/// One icon set entry as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub source_dir: PathBuf,
    pub target_file: PathBuf,
    pub prefix: String,
    #[serde(default)]
    pub expected_size: Option<ExpectedSize>,
    #[serde(default)]
    pub icon_set_info: Option<IconSetInfo>,
    #[serde(default)]
    pub skip_size_validation: bool,
    #[serde(default)]
    pub debug: Option<bool>,
    /// Alias name to parent name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default)]
    pub size_mismatch: SizeMismatchPolicy,
}

/// A validated job, ready for the batch runner.
#[derive(Debug, Clone)]
pub struct IconSetJob {
    pub source_dir: PathBuf,
    pub target_file: PathBuf,
    pub prefix: String,
    pub expected_size: Option<ExpectedSize>,
    pub info: Option<IconSetInfo>,
    pub skip_size_validation: bool,
    pub debug_enabled: bool,
    pub aliases: BTreeMap<String, String>,
    pub precision: u8,
    pub size_mismatch: SizeMismatchPolicy,
}

impl IconSetJob {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        target_file: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_file: target_file.into(),
            prefix: prefix.into(),
            expected_size: None,
            info: None,
            skip_size_validation: false,
            debug_enabled: false,
            aliases: BTreeMap::new(),
            precision: DEFAULT_PRECISION,
            size_mismatch: SizeMismatchPolicy::default(),
        }
    }

    /// Validate a descriptor. The global debug flag can only turn debug on.
    pub fn resolve(
        descriptor: JobDescriptor,
        index: usize,
        global_debug: bool,
    ) -> Result<Self, ConfigError> {
        let invalid = |message: &str| ConfigError::Invalid {
            index,
            message: message.to_string(),
        };
        if descriptor.prefix.trim().is_empty() {
            return Err(invalid("prefix must not be empty"));
        }
        if descriptor.source_dir.as_os_str().is_empty() {
            return Err(invalid("sourceDir must not be empty"));
        }
        if descriptor.target_file.as_os_str().is_empty() {
            return Err(invalid("targetFile must not be empty"));
        }

        Ok(Self {
            source_dir: descriptor.source_dir,
            target_file: descriptor.target_file,
            prefix: descriptor.prefix,
            expected_size: descriptor.expected_size,
            info: descriptor.icon_set_info,
            skip_size_validation: descriptor.skip_size_validation,
            debug_enabled: global_debug || descriptor.debug.unwrap_or(false),
            aliases: descriptor.aliases,
            precision: descriptor.precision.unwrap_or(DEFAULT_PRECISION),
            size_mismatch: descriptor.size_mismatch,
        })
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

fn descriptor_at<T, E: std::fmt::Display>(
    index: usize,
    parsed: Result<T, E>,
) -> Result<T, ConfigError> {
    parsed.map_err(|e| ConfigError::Invalid {
        index,
        message: e.to_string(),
    })
}

/// Read a config file into descriptors. An object yields one descriptor,
/// an array yields one per element in order. TOML files use a top-level
/// `iconSets` array for several descriptors.
pub fn load_config(path: &Path) -> Result<Vec<JobDescriptor>, ConfigError> {
    let ext = extension(path);
    if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ConfigError::ScriptConfig {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Read config file");

    if ext == "toml" {
        let mut table: toml::Table = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        return match table.remove("iconSets") {
            Some(toml::Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| descriptor_at(i, item.try_into::<JobDescriptor>()))
                .collect(),
            Some(_) => Err(ConfigError::Invalid {
                index: 0,
                message: "iconSets must be an array of tables".to_string(),
            }),
            None => descriptor_at(0, toml::Value::Table(table).try_into::<JobDescriptor>())
                .map(|d| vec![d]),
        };
    }

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        single => {
            tracing::debug!("Converting single config to array");
            vec![single]
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| descriptor_at(i, serde_json::from_value::<JobDescriptor>(item)))
        .collect()
}

pub fn resolve_jobs(
    descriptors: Vec<JobDescriptor>,
    global_debug: bool,
) -> Result<Vec<IconSetJob>, ConfigError> {
    descriptors
        .into_iter()
        .enumerate()
        .map(|(i, d)| IconSetJob::resolve(d, i, global_debug))
        .collect()
}

pub fn load_jobs(path: &Path, global_debug: bool) -> Result<Vec<IconSetJob>, ConfigError> {
    let jobs = resolve_jobs(load_config(path)?, global_debug)?;
    tracing::debug!(count = jobs.len(), "Found icon set configurations");
    Ok(jobs)
}
