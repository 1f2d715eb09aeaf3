//! Platform-specific root directory resolution.
//!
//! Every root returned here is guaranteed to exist and be writable by the
//! time the caller sees it — `ensure_directory` runs as part of resolution,
//! not as a separate step callers have to remember.

use std::env;
use std::path::PathBuf;

use super::ensure::ensure_directory;
use super::error::PathError;

/// Root directory for process configuration (the TOML config file).
///
/// Resolution order:
/// 1. `MEDIAORC_CONFIG_DIR` environment variable (highest priority)
/// 2. System config directory (e.g. `~/.config/media-orchestrator`)
pub fn config_root() -> Result<PathBuf, PathError> {
    let root = if let Ok(path) = env::var("MEDIAORC_CONFIG_DIR") {
        PathBuf::from(path)
    } else {
        dirs::config_dir().ok_or(PathError::NoDataDir)?.join("media-orchestrator")
    };
    ensure_directory(&root)?;
    Ok(root)
}

/// Root directory for cache entries (the C2 cache store).
///
/// Resolution order:
/// 1. `MEDIAORC_CACHE_DIR` environment variable
/// 2. System cache directory (e.g. `~/.cache/media-orchestrator`)
pub fn cache_root() -> Result<PathBuf, PathError> {
    let root = if let Ok(path) = env::var("MEDIAORC_CACHE_DIR") {
        PathBuf::from(path)
    } else {
        dirs::cache_dir().ok_or(PathError::NoDataDir)?.join("media-orchestrator")
    };
    ensure_directory(&root)?;
    Ok(root)
}

/// Root directory for debug logs.
///
/// Resolution order:
/// 1. `MEDIAORC_LOG_DIR` environment variable
/// 2. `<cache_root>/logs`
pub fn logs_root() -> Result<PathBuf, PathError> {
    let root = match env::var("MEDIAORC_LOG_DIR") {
        Ok(path) => PathBuf::from(path),
        Err(_) => cache_root()?.join("logs"),
    };
    ensure_directory(&root)?;
    Ok(root)
}

/// Root directory for ephemeral worker-subprocess files.
///
/// Resolution order:
/// 1. `MEDIAORC_TEMP_DIR` environment variable
/// 2. The system temp directory
///
/// Unlike the other roots, this one is never auto-created: the system temp
/// directory always exists, and an operator-supplied override is expected
/// to point at something already there.
pub fn temp_root() -> PathBuf {
    env::var("MEDIAORC_TEMP_DIR").map_or_else(|_| env::temp_dir(), PathBuf::from)
}
