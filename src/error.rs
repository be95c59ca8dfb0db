use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Structural and I/O failures. Content-level mismatches never show up here;
/// they are reported as parse diagnostics instead.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("unsupported schema version {found:?} (supported: {supported})")]
    UnsupportedVersion { found: String, supported: String },

    #[error("schema is missing required key `{0}`")]
    MissingKey(String),

    #[error("schema is missing required pattern `{0}`")]
    MissingPattern(String),

    #[error("pattern `{pattern}` does not compile: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern `{pattern}` is missing required named group `{group}`")]
    MissingGroup { pattern: String, group: String },

    #[error("malformed schema: {0}")]
    Malformed(String),

    #[error("malformed schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey(key.into())
    }

    /// True for configuration faults in the schema itself, false for I/O.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}
