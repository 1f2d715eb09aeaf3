//! Download job endpoints (§6): submit, list, get, cancel.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use media_core::error::ApiError;
use media_core::job::JobStatus;
use media_core::params::DownloadParameters;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct QueueDownloadResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub created_time: DateTime<Utc>,
}

pub async fn queue(
    State(state): State<AppState>,
    ValidatedJson(params): ValidatedJson<DownloadParameters>,
) -> Result<(StatusCode, Json<QueueDownloadResponse>), HttpError> {
    let job_id = state.queue.enqueue(params).await?;
    let job = state
        .queue
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::job_not_found(&job_id))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(QueueDownloadResponse {
            job_id,
            status: job.status,
            created_time: job.created_time,
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<JobStatus>,
    pub service: Option<String>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<media_core::queue::JobSummary>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Json<ListJobsResponse> {
    let snapshot = state.queue.snapshot().await;
    let mut jobs: Vec<_> = snapshot
        .jobs
        .into_iter()
        .filter(|j| query.status.is_none_or(|s| j.status == s))
        .filter(|j| query.service.as_deref().is_none_or(|s| j.service == s))
        .collect();

    match query.sort_by.as_deref() {
        Some("progress") => jobs.sort_by(|a, b| a.progress_percent.total_cmp(&b.progress_percent)),
        Some("service") => jobs.sort_by(|a, b| a.service.cmp(&b.service)),
        Some("title_id") => jobs.sort_by(|a, b| a.title_id.cmp(&b.title_id)),
        _ => jobs.sort_by(|a, b| a.id.cmp(&b.id)),
    }
    if query.sort_order == SortOrder::Desc {
        jobs.reverse();
    }

    Json(ListJobsResponse { jobs })
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<media_core::job::Job>, HttpError> {
    state
        .queue
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::job_not_found(&id).into())
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub status: &'static str,
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, HttpError> {
    state.queue.cancel(&id).await?;
    Ok(Json(CancelResponse { status: "success" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_to_ascending() {
        let query: ListJobsQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.sort_order, SortOrder::Asc);
        assert!(query.status.is_none());
    }
}
