//! `GET /health` and the best-effort update lookup (C9).

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub update_check: UpdateCheck,
}

#[derive(Debug, Serialize)]
pub struct UpdateCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_available: Option<bool>,
    pub current_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestVersionResponse {
    version: String,
}

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let update_check = check_for_update(state.config.update_check_url.as_deref()).await;

    Json(HealthResponse {
        status: "ok",
        version: CURRENT_VERSION,
        update_check,
    })
}

/// Best-effort lookup of the latest released version. Any failure —
/// missing config, network error, malformed response — reports
/// `update_available: null` rather than surfacing an error (§4.9).
async fn check_for_update(update_check_url: Option<&str>) -> UpdateCheck {
    let Some(url) = update_check_url else {
        return UpdateCheck {
            update_available: None,
            current_version: CURRENT_VERSION,
            latest_version: None,
        };
    };

    match fetch_latest_version(url).await {
        Some(latest) => UpdateCheck {
            update_available: Some(latest != CURRENT_VERSION),
            current_version: CURRENT_VERSION,
            latest_version: Some(latest),
        },
        None => UpdateCheck {
            update_available: None,
            current_version: CURRENT_VERSION,
            latest_version: None,
        },
    }
}

async fn fetch_latest_version(url: &str) -> Option<String> {
    let response = reqwest::get(url).await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let parsed: LatestVersionResponse = response.json().await.ok()?;
    Some(parsed.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_update_url_reports_null_availability() {
        let check = check_for_update(None).await;
        assert_eq!(check.update_available, None);
        assert_eq!(check.latest_version, None);
    }

    #[tokio::test]
    async fn unreachable_update_url_reports_null_availability() {
        let check = check_for_update(Some("http://127.0.0.1:1/nonexistent")).await;
        assert_eq!(check.update_available, None);
    }
}
