//! `GET /services` — the registered service-adapter tags.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub services: Vec<String>,
}

pub async fn list(State(state): State<AppState>) -> Json<ServicesResponse> {
    Json(ServicesResponse {
        services: state.services.tags(),
    })
}
