//! CLI-specific error types and exit-code mapping.

use thiserror::Error;

/// Top-level CLI error. Most call sites just propagate `anyhow::Error` out
/// of `main`; this type exists for the cases that want a stable exit code
/// (sysexits.h-flavored, matching conventional Unix tooling).
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Api(#[from] media_core::error::ApiError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 78,  // EX_CONFIG
            CliError::Api(_) => 1,
            CliError::Io(_) => 74, // EX_IOERR
        }
    }
}

impl From<media_core::settings::ConfigError> for CliError {
    fn from(err: media_core::settings::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_exits_78() {
        let err = CliError::Config("bad bind_addr".into());
        assert_eq!(err.exit_code(), 78);
    }
}
