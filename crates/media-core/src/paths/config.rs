//! Configuration file utilities.
//!
//! Provides functions for locating and loading the TOML config file
//! that stores user overrides for `AppConfig` (see `crate::settings`).

use std::fs;
use std::path::PathBuf;

use super::error::PathError;
use super::platform::config_root;

/// Location of the TOML config file.
pub fn config_file_path() -> Result<PathBuf, PathError> {
    Ok(config_root()?.join("config.toml"))
}

/// Read the config file's raw contents, if present.
///
/// Returns `Ok(None)` when the file does not exist — this is not an error,
/// since `AppConfig::with_defaults` covers every field.
pub fn read_config_file() -> Result<Option<String>, PathError> {
    let path = config_file_path()?;
    if !path.exists() {
        return Ok(None);
    }

    fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| PathError::ConfigFileError {
            path,
            reason: e.to_string(),
        })
}

/// Write the given TOML text to the config file. `config_file_path`'s call
/// to `config_root` has already ensured the parent directory exists.
pub fn write_config_file(contents: &str) -> Result<(), PathError> {
    let path = config_file_path()?;
    fs::write(&path, contents).map_err(|e| PathError::ConfigFileError {
        path,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_utils::{ENV_LOCK, EnvVarGuard};
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read_config_file_round_trips() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp = tempdir().unwrap();
        let _env_guard =
            EnvVarGuard::set("MEDIAORC_CONFIG_DIR", temp.path().to_string_lossy().as_ref());

        write_config_file("max_concurrent_downloads = 4\n").unwrap();
        let contents = read_config_file().unwrap().unwrap();
        assert!(contents.contains("max_concurrent_downloads"));
    }

    #[test]
    fn test_missing_config_file_is_not_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp = tempdir().unwrap();
        let _env_guard =
            EnvVarGuard::set("MEDIAORC_CONFIG_DIR", temp.path().to_string_lossy().as_ref());

        assert!(read_config_file().unwrap().is_none());
    }
}
