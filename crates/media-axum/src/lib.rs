//! Axum HTTP API (C7) for the media archival orchestrator: request
//! validation, job submission, and read-through access to the scheduler.

pub mod bootstrap;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, start_server};
pub use error::HttpError;
pub use extract::ValidatedJson;
pub use routes::create_router;
pub use state::AppState;

#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use hyper as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;
