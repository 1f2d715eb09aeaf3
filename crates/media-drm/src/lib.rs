//! DRM session management (C3): key-ID normalization, request/response
//! shaping, outbound authentication, a retrying HTTP session, a local key
//! vault port, and the session manager that ties them into the licensing
//! algorithm.

pub mod auth;
pub mod error;
pub mod http_session;
pub mod kid;
pub mod session;
pub mod shaping;
pub mod vault;

pub use auth::AuthStrategy;
pub use error::DrmError;
pub use http_session::{RetryPolicy, RetryingSession, SessionError};
pub use kid::{Key, merge_keys_dedup, normalize_kid};
pub use session::{DrmClientConfig, DrmSessionManager, LicenseType, PrivacyMode, SessionId, format_session_id};
pub use shaping::{ClientConfig, Condition, ConditionOp, ConditionalParam, Transform, build_request_body};
pub use vault::{KeyVault, is_zero_key};

#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;
