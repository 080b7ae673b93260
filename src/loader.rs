//! Schema and record loading from the filesystem.
//!
//! Each file handle is scoped to one read; the compiled schema is immutable
//! for the rest of the run and may be reused across every record in a batch.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::SchemaNode;

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if the file doesn't exist,
/// `ReadError` if it can't be read, or `InvalidJson` if it isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and compile a schema file.
///
/// # Errors
///
/// Returns the `load_json` errors plus `ConfigError::InvalidSchema` when the
/// document cannot be compiled into the node model.
pub fn load_schema(path: &Path) -> Result<SchemaNode, ConfigError> {
    let raw = load_json(path)?;
    SchemaNode::compile(&raw)
}

/// Enumerate record files in a directory: `.json` files, sorted by name,
/// excluding `exclude` (the schema file) by file name.
///
/// # Errors
///
/// Returns `ConfigError::DirNotFound` or `DirReadError`; a missing record
/// directory is fatal, never an empty batch.
pub fn collect_record_files(
    dir: &Path,
    exclude: Option<&OsStr>,
) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::DirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::DirReadError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !path.extension().map(|e| e == "json").unwrap_or(false) {
            continue;
        }
        if exclude.is_some() && path.file_name() == exclude {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}
