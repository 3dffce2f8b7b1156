//! Snapshot loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::snapshot::model::{ConfigSnapshot, RawSnapshot};
use crate::snapshot::validation::{validate, ValidationError, ValidationOptions};

/// Error type for snapshot loading.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The source file could not be opened or read.
    #[error("snapshot source {path} unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content does not deserialize into the snapshot shape.
    #[error("malformed snapshot {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The document deserialized but failed structural validation.
    #[error("invalid snapshot {path}: {source}")]
    InvalidSnapshot {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    /// The file watcher backing the reload loop could not be started.
    #[error("cannot watch {path}: {reason}")]
    Watch { path: PathBuf, reason: String },
}

/// On-disk serialization of a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Yaml,
    Json,
    Toml,
}

impl SnapshotFormat {
    /// Pick the format from the file extension. Anything unknown is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    fn parse(self, content: &str) -> Result<RawSnapshot, String> {
        if content.trim().is_empty() {
            return Ok(RawSnapshot::new());
        }
        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Parse and validate snapshot content. `path` is only used for error context.
pub fn parse_snapshot(
    path: &Path,
    content: &str,
    options: ValidationOptions,
) -> Result<ConfigSnapshot, SnapshotError> {
    let raw = SnapshotFormat::from_path(path)
        .parse(content)
        .map_err(|reason| SnapshotError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;

    validate(raw, options).map_err(|source| SnapshotError::InvalidSnapshot {
        path: path.to_path_buf(),
        source,
    })
}

/// Read, parse and validate a snapshot file.
pub fn load_snapshot(path: &Path, options: ValidationOptions) -> Result<ConfigSnapshot, SnapshotError> {
    let content = fs::read_to_string(path).map_err(|source| SnapshotError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshot(path, &content, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SnapshotFormat::from_path(Path::new("a.yaml")), SnapshotFormat::Yaml);
        assert_eq!(SnapshotFormat::from_path(Path::new("a.yml")), SnapshotFormat::Yaml);
        assert_eq!(SnapshotFormat::from_path(Path::new("a.JSON")), SnapshotFormat::Json);
        assert_eq!(SnapshotFormat::from_path(Path::new("a.toml")), SnapshotFormat::Toml);
        assert_eq!(SnapshotFormat::from_path(Path::new("/dev/null")), SnapshotFormat::Yaml);
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = r#"{"app":{"cluster":{"ns":{"releaseKey":"abc","configurations":{"k":"v"}}}}}"#;
        let snapshot = parse_snapshot(Path::new("s.json"), json, ValidationOptions::default()).unwrap();
        assert_eq!(snapshot.namespace("app", "cluster", "ns").unwrap().configurations["k"], "v");

        let toml = "[app.cluster.ns]\nreleaseKey = \"abc\"\n[app.cluster.ns.configurations]\nk = \"v\"\n";
        let snapshot = parse_snapshot(Path::new("s.toml"), toml, ValidationOptions::default()).unwrap();
        assert_eq!(snapshot.namespace("app", "cluster", "ns").unwrap().release_key, "abc");
    }

    #[test]
    fn test_empty_content_is_invalid() {
        let err = parse_snapshot(Path::new("s.yaml"), "  \n", ValidationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::InvalidSnapshot {
                source: ValidationError::Empty,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_content() {
        let err = parse_snapshot(Path::new("s.yaml"), "- just\n- a list\n", ValidationOptions::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&dir.path().join("missing.yaml"), ValidationOptions::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::SourceUnavailable { .. }));
    }
}
