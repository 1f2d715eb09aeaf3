//! Auto-creating, writability-checked directory roots.
//!
//! Every root this crate resolves (config, cache, logs) is expected to
//! exist and accept writes by the time the caller gets a `PathBuf` back —
//! there is no "ask the user first" mode here, so `platform` calls this
//! unconditionally rather than threading a strategy flag through.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::error::PathError;

/// Create `path` (and its parents) if it doesn't exist, then confirm it's
/// writable. Fails if `path` exists but is a file.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    verify_writable(path)
}

/// Verify a directory is writable by creating and removing a throwaway file.
pub fn verify_writable(path: &Path) -> Result<(), PathError> {
    let probe = path.join(".mediaorc_write_test");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&probe)
        .map_err(|e| PathError::NotWritable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    file.write_all(b"test").map_err(|e| PathError::NotWritable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    drop(file);
    let _ = fs::remove_file(&probe);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn creates_missing_directory_and_its_parents() {
        let root = tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        assert!(!nested.exists());

        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn existing_directory_is_left_alone() {
        let root = tempdir().unwrap();
        ensure_directory(root.path()).unwrap();
        assert!(root.path().is_dir());
    }

    #[test]
    fn rejects_a_path_that_is_a_file() {
        let root = tempdir().unwrap();
        let file_path = root.path().join("not_a_dir");
        fs::write(&file_path, b"x").unwrap();

        let result = ensure_directory(&file_path);
        assert!(matches!(result, Err(PathError::NotADirectory(_))));
    }
}
