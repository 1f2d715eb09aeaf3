//! Shared application state type.

use std::sync::Arc;

use crate::bootstrap::AxumContext;

/// Application state shared across all handlers: an `Arc`-wrapped
/// `AxumContext` built once by the composition root and cloned per request.
pub type AppState = Arc<AxumContext>;
