//! Integration tests for the HTTP API: verifies routes are wired to the
//! right handlers and return the response shapes §6 describes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use async_trait::async_trait;
use media_axum::bootstrap::{AxumContext, CorsConfig};
use media_axum::routes::create_router;
use media_core::error::ApiError;
use media_core::job::Job;
use media_core::params::DownloadParameters;
use media_core::ports::{JobQueuePort, ServiceRegistry};
use media_core::queue::QueueSnapshot;
use media_core::settings::AppConfig;

/// A `JobQueuePort` double with no jobs and nothing to enqueue onto,
/// enough to exercise every route without a real scheduler.
struct EmptyQueue;

#[async_trait]
impl JobQueuePort for EmptyQueue {
    async fn enqueue(&self, params: DownloadParameters) -> Result<String, ApiError> {
        media_core::params::validate_parameters(&params).map_err(|e| ApiError::invalid_parameters(e.to_string()))?;
        Ok("00000000-0000-0000-0000-000000000000".to_string())
    }

    async fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot::from_jobs(std::iter::empty())
    }

    async fn get(&self, _id: &str) -> Option<Job> {
        None
    }

    async fn cancel(&self, id: &str) -> Result<(), ApiError> {
        Err(ApiError::job_not_found(id))
    }

    async fn active_count(&self) -> u32 {
        0
    }

    async fn pending_count(&self) -> u32 {
        0
    }
}

fn test_router() -> axum::Router {
    let ctx = AxumContext::new(
        Arc::new(EmptyQueue),
        ServiceRegistry::new(),
        Vec::new(),
        AppConfig::with_defaults(),
    );
    create_router(Arc::new(ctx), &CorsConfig::AllowAll)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let response = test_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["update_check"]["update_available"].is_null());
}

#[tokio::test]
async fn services_endpoint_reflects_empty_registry() {
    let response = test_router()
        .oneshot(Request::builder().uri("/services").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["services"], serde_json::json!([]));
}

#[tokio::test]
async fn list_titles_with_unknown_service_is_a_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/list-titles")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({"service": "NOPE", "title_id": "T1"}).to_string()))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_with_missing_service_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/download")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({"title_id": "T1"}).to_string()))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_with_unrecognized_codec_is_bad_request_not_a_raw_rejection() {
    let request = Request::builder()
        .method("POST")
        .uri("/download")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({"service": "EX", "title_id": "x", "vcodec": "MPEG2"}).to_string(),
        ))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let envelope: ApiError = serde_json::from_slice(&body).unwrap();
    assert_eq!(envelope.error_code, media_core::error::ErrorCode::InvalidParameters);
}

#[tokio::test]
async fn get_unknown_job_is_not_found() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/download/jobs/00000000-0000-0000-0000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_jobs_on_empty_queue_is_an_empty_array() {
    let response = test_router()
        .oneshot(Request::builder().uri("/download/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["jobs"], serde_json::json!([]));
}
