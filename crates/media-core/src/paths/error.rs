//! Path-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or preparing an on-disk root.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the platform's base directory (config/cache).
    #[error("cannot determine platform base directory")]
    NoDataDir,

    /// A root path exists but is not a directory.
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// A directory is not writable.
    #[error("directory {path} is not writable: {reason}")]
    NotWritable { path: PathBuf, reason: String },

    /// Failed to read or write the config file.
    #[error("failed to access config file {path}: {reason}")]
    ConfigFileError { path: PathBuf, reason: String },
}
