//! DRM-specific errors (§4.3), surfaced to the worker runtime as plain
//! `Display` strings so `media_core::error::categorize` can map them the
//! same way it maps every other subsystem's failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrmError {
    #[error("unknown DRM session")]
    InvalidSession,

    #[error("DRM request failed: {0}")]
    RequestFailed(String),

    #[error("DRM network error: {0}")]
    NetworkError(String),

    #[error("license challenge requested before a challenge was issued")]
    NoChallengeIssued,

    #[error("key vault error: {0}")]
    VaultError(String),
}
