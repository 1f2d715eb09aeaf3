//! Route definitions and router construction (§6).

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::bootstrap::CorsConfig;
use crate::handlers;
use crate::state::AppState;

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// All routes except `/health`, which is mounted separately since it isn't
/// nested under `/api` (§6's endpoint table uses bare paths).
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(handlers::services::list))
        .route("/list-titles", post(handlers::titles::list_titles))
        .route("/list-tracks", post(handlers::tracks::list_tracks))
        .route("/download", post(handlers::downloads::queue))
        .route("/download/jobs", get(handlers::downloads::list))
        .route(
            "/download/jobs/:id",
            get(handlers::downloads::get).delete(handlers::downloads::cancel),
        )
}

/// Build the complete router for the media orchestrator's HTTP API.
pub fn create_router(state: AppState, cors_config: &CorsConfig) -> Router {
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(api_routes())
        .with_state(state)
        .layer(cors)
}
