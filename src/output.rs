//! Output Writer
//!
//! Serializes an exported icon set and hands the bytes to a sink.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::icon_set::IconSet;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize icon set: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Destination for exported files.
pub trait OutputSink {
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()>;
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Writes to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl OutputSink for FsSink {
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }
}

/// Pretty-printed JSON with two-space indentation and no trailing newline.
pub fn to_json(set: &IconSet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(set)
}

/// Write `set` to `target`, creating parent directories first. A failed
/// mkdir is only logged: the write itself decides success.
pub fn write_icon_set(
    sink: &mut dyn OutputSink,
    target: &Path,
    set: &IconSet,
) -> Result<usize, OutputError> {
    let json = to_json(set)?;

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = sink.create_dir_all(parent) {
            tracing::warn!(dir = %parent.display(), error = %e, "Could not create output directory");
        }
    }

    sink.write(target, json.as_bytes())
        .map_err(|source| OutputError::Write {
            path: target.to_path_buf(),
            source,
        })?;
    Ok(json.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon_set::IconSetBuilder;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        fail_mkdir: bool,
        fail_write: bool,
        dirs: Vec<PathBuf>,
        files: Vec<(PathBuf, Vec<u8>)>,
    }

    impl OutputSink for RecordingSink {
        fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
            self.dirs.push(path.to_path_buf());
            if self.fail_mkdir {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "mkdir denied"));
            }
            Ok(())
        }

        fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
            if self.fail_write {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.files.push((path.to_path_buf(), contents.to_vec()));
            Ok(())
        }
    }

    fn sample() -> IconSet {
        let mut builder = IconSetBuilder::new("demo");
        builder.add_svg("dot", r#"<svg viewBox="0 0 24 24"><circle cx="12" cy="12" r="2"/></svg>"#);
        builder.export()
    }

    #[test]
    fn test_json_is_two_space_indented() {
        let json = to_json(&sample()).unwrap();
        assert!(json.starts_with("{\n  \"prefix\": \"demo\",\n  \"icons\": {\n    \"dot\": {"));
        assert!(json.ends_with('}'));
        assert!(!json.ends_with('\n'));
    }

    #[test]
    fn test_mkdir_failure_still_writes() {
        let mut sink = RecordingSink {
            fail_mkdir: true,
            ..Default::default()
        };
        let bytes = write_icon_set(&mut sink, Path::new("out/demo.json"), &sample()).unwrap();
        assert_eq!(sink.dirs, vec![PathBuf::from("out")]);
        assert_eq!(sink.files.len(), 1);
        assert_eq!(sink.files[0].1.len(), bytes);
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let mut sink = RecordingSink {
            fail_write: true,
            ..Default::default()
        };
        let err = write_icon_set(&mut sink, Path::new("demo.json"), &sample()).unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
        assert!(sink.dirs.is_empty());
    }

    #[test]
    fn test_fs_sink_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/demo.json");
        write_icon_set(&mut FsSink, &target, &sample()).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["icons"]["dot"]["width"], 24);
    }
}
