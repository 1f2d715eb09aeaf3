//! `POST /list-titles` (§6).

use axum::Json;
use axum::extract::State;
use media_core::error::{ApiError, ErrorCode};
use media_core::proxy::{parse_proxy_spec, resolve_proxy};
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTitlesRequest {
    pub service: String,
    pub title_id: String,
    pub profile: Option<String>,
    pub proxy: Option<String>,
    #[serde(default)]
    pub no_proxy: bool,
}

#[derive(Debug, Serialize)]
pub struct ListTitlesResponse {
    pub titles: Vec<media_core::ports::Title>,
}

pub async fn list_titles(
    State(state): State<AppState>,
    Json(req): Json<ListTitlesRequest>,
) -> Result<Json<ListTitlesResponse>, HttpError> {
    let adapter = state
        .services
        .get(&req.service)
        .ok_or_else(|| ApiError::new(ErrorCode::InvalidService, format!("unknown service {}", req.service)))?;

    if !req.no_proxy {
        if let Some(raw) = &req.proxy {
            let spec = parse_proxy_spec(raw);
            resolve_proxy(&spec, &state.proxy_providers).await?;
        }
    }

    adapter.authenticate(req.profile.as_deref()).await?;
    let titles = adapter.get_titles(&req.title_id).await?;

    Ok(Json(ListTitlesResponse { titles }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_deserializes_with_only_required_fields() {
        let json = serde_json::json!({"service": "EX", "title_id": "TT001"});
        let req: ListTitlesRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.service, "EX");
        assert!(!req.no_proxy);
    }
}
