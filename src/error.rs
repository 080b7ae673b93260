//! Error types for schema loading, validation setup, and docs output.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors.
///
/// These abort the entire invocation before any record is checked: a schema
/// or record directory that cannot be read is never partially processed.
/// Per-record failures are not configuration errors; they are reported as
/// `parse` field errors and the batch continues.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("record directory not found: {path}")]
    DirNotFound { path: PathBuf },

    #[error("cannot read record directory {path}: {source}")]
    DirReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema parsed as JSON but cannot be compiled into the node model.
    /// `location` is a JSON-pointer-style path within the schema document.
    #[error("invalid schema at \"{location}\": {message}")]
    InvalidSchema { location: String, message: String },
}

/// Errors during reference documentation generation.
///
/// Rendering itself never fails; only loading the schema or writing the
/// output file can.
#[derive(Debug, Error)]
pub enum DocsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
