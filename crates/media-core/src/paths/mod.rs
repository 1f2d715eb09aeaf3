//! Path utilities for the orchestrator's on-disk roots: config, cache, logs
//! and worker-subprocess temp files.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod config;
mod ensure;
mod error;
mod platform;

#[cfg(test)]
mod test_utils;

// Re-export public API

// Error type
pub use error::PathError;

// Root directories
pub use platform::{cache_root, config_root, logs_root, temp_root};

// Directory operations
pub use ensure::{ensure_directory, verify_writable};

// Configuration persistence
pub use config::{config_file_path, read_config_file, write_config_file};
