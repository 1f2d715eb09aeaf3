//! Structured error taxonomy (component C1).
//!
//! `ApiError` is the single error type that crosses every public boundary of
//! the orchestrator: worker result files, the scheduler, and the HTTP API.
//! It is deliberately flat and serializable so it survives a subprocess
//! round-trip intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable error codes returned to API clients.
///
/// Ordering in source mirrors the categorizer's rule order (§4.1): earlier
/// variants take precedence when a failure message matches more than one
/// rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    InvalidService,
    InvalidTitleId,
    InvalidProfile,
    InvalidProxy,
    InvalidLanguage,
    InvalidParameters,
    AuthRequired,
    AuthFailed,
    Forbidden,
    Geofence,
    NotFound,
    NoContent,
    JobNotFound,
    RateLimited,
    InternalError,
    DownloadError,
    WorkerError,
    ServiceError,
    DrmError,
    NetworkError,
    ServiceUnavailable,
}

impl ErrorCode {
    /// Default HTTP status code for this error code (§4.1 table).
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput
            | Self::InvalidService
            | Self::InvalidTitleId
            | Self::InvalidProfile
            | Self::InvalidProxy
            | Self::InvalidLanguage
            | Self::InvalidParameters => 400,
            Self::AuthRequired | Self::AuthFailed => 401,
            Self::Forbidden | Self::Geofence => 403,
            Self::NotFound | Self::NoContent | Self::JobNotFound => 404,
            Self::RateLimited => 429,
            Self::InternalError | Self::DownloadError | Self::WorkerError => 500,
            Self::ServiceError | Self::DrmError => 502,
            Self::NetworkError | Self::ServiceUnavailable => 503,
        }
    }

    /// Whether this error code is retryable by default.
    #[must_use]
    pub const fn default_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::NetworkError | Self::ServiceUnavailable
        )
    }
}

/// The public error envelope returned by every HTTP error response and
/// stored on a failed `Job`.
#[derive(Clone, Debug, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: ErrorStatus,
    pub error_code: ErrorCode,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

/// Discriminant for the envelope's `status` field; always `"error"` on the
/// wire but kept as a real type so callers cannot construct a malformed
/// envelope.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    Error,
}

/// Extra diagnostic information, included only when `AppConfig.debug_mode`
/// is set (§4.1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebugInfo {
    pub exception_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl ApiError {
    /// Construct an error with the default HTTP status / retryable hint for
    /// `code`, and no debug info.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::Error,
            error_code: code,
            message: message.into(),
            timestamp: Utc::now(),
            details: None,
            retryable: Some(code.default_retryable()),
            debug_info: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_debug_info(mut self, exception_type: impl Into<String>, traceback: Option<String>) -> Self {
        self.debug_info = Some(DebugInfo {
            exception_type: exception_type.into(),
            traceback,
        });
        self
    }

    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.error_code.http_status()
    }

    pub fn job_not_found(job_id: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::JobNotFound, format!("job {job_id} not found"))
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameters, message)
    }
}

/// Categorize an arbitrary failure's message and type name into a stable
/// `ErrorCode`, applying the ordered substring rules of §4.1.
///
/// Matching is case-insensitive and the FIRST matching rule wins — this is
/// load-bearing: an auth-flavored message always outranks a network-flavored
/// one, even when both substrings are present (e.g. "auth service timed
/// out" categorizes as `AuthFailed`, not `NetworkError`).
#[must_use]
pub fn categorize(message: &str, type_name: &str) -> ErrorCode {
    let m = message.to_ascii_lowercase();
    let t = type_name;

    const AUTH_SUBSTRINGS: &[&str] = &[
        "auth", "login", "credential", "unauthorized", "forbidden", "token",
    ];
    const NETWORK_SUBSTRINGS: &[&str] = &[
        "connection", "timeout", "network", "unreachable", "socket", "dns", "resolve",
    ];
    const NETWORK_TYPES: &[&str] = &["ConnectionError", "TimeoutError", "URLError", "SSLError"];
    const GEOFENCE_SUBSTRINGS: &[&str] = &["geofence", "region", "not available in", "territory"];
    const NOT_FOUND_SUBSTRINGS: &[&str] = &["not found", "404", "does not exist", "invalid id"];
    const RATE_LIMIT_SUBSTRINGS: &[&str] = &["rate limit", "too many requests", "429", "throttle"];
    const DRM_SUBSTRINGS: &[&str] = &["drm", "license", "widevine", "playready", "decrypt"];
    const UNAVAILABLE_SUBSTRINGS: &[&str] = &[
        "service unavailable",
        "503",
        "maintenance",
        "temporarily unavailable",
    ];
    const INVALID_SUBSTRINGS: &[&str] = &["invalid", "malformed", "validation"];
    const INVALID_TYPES: &[&str] = &["ValueError", "ValidationError"];

    if AUTH_SUBSTRINGS.iter().any(|s| m.contains(s)) {
        return ErrorCode::AuthFailed;
    }
    if NETWORK_SUBSTRINGS.iter().any(|s| m.contains(s)) || NETWORK_TYPES.contains(&t) {
        return ErrorCode::NetworkError;
    }
    if GEOFENCE_SUBSTRINGS.iter().any(|s| m.contains(s)) {
        return ErrorCode::Geofence;
    }
    if NOT_FOUND_SUBSTRINGS.iter().any(|s| m.contains(s)) {
        return ErrorCode::NotFound;
    }
    if RATE_LIMIT_SUBSTRINGS.iter().any(|s| m.contains(s)) {
        return ErrorCode::RateLimited;
    }
    if DRM_SUBSTRINGS.iter().any(|s| m.contains(s)) {
        return ErrorCode::DrmError;
    }
    if UNAVAILABLE_SUBSTRINGS.iter().any(|s| m.contains(s)) {
        return ErrorCode::ServiceUnavailable;
    }
    if INVALID_SUBSTRINGS.iter().any(|s| m.contains(s)) || INVALID_TYPES.contains(&t) {
        return ErrorCode::InvalidInput;
    }
    ErrorCode::InternalError
}

/// Build an `ApiError` for an arbitrary failure by running it through
/// `categorize`.
#[must_use]
pub fn from_failure(message: &str, type_name: &str) -> ApiError {
    ApiError::new(categorize(message, type_name), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizer_is_case_insensitive() {
        assert_eq!(categorize("NETWORK TIMEOUT", "Error"), ErrorCode::NetworkError);
    }

    #[test]
    fn auth_dominates_network_when_both_present() {
        assert_eq!(
            categorize("auth service timed out", "Error"),
            ErrorCode::AuthFailed
        );
    }

    #[test]
    fn network_wins_without_auth_wording() {
        assert_eq!(
            categorize("connection timed out", "Error"),
            ErrorCode::NetworkError
        );
    }

    #[test]
    fn defaults_to_internal_error() {
        assert_eq!(categorize("kaboom", "RuntimeError"), ErrorCode::InternalError);
    }

    #[test]
    fn rate_limited_is_retryable_by_default() {
        let err = ApiError::new(ErrorCode::RateLimited, "slow down");
        assert_eq!(err.retryable, Some(true));
        assert_eq!(err.http_status(), 429);
    }

    #[test]
    fn invalid_input_is_not_retryable_by_default() {
        let err = ApiError::new(ErrorCode::InvalidInput, "bad request");
        assert_eq!(err.retryable, Some(false));
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn serializes_without_debug_info_by_default() {
        let err = ApiError::new(ErrorCode::NotFound, "missing");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("debug_info"));
    }

    #[test]
    fn categorizer_is_deterministic() {
        let a = categorize("license challenge rejected", "DrmError");
        let b = categorize("license challenge rejected", "DrmError");
        assert_eq!(a, b);
        assert_eq!(a, ErrorCode::DrmError);
    }
}
