//! A `Json` extractor whose rejection conforms to the API's error envelope
//! (§4.7) instead of axum's default plain-text body.

use axum::Json;
use axum::extract::{FromRequest, Request};
use media_core::error::ApiError;
use serde::de::DeserializeOwned;

use crate::error::HttpError;

/// Like `axum::Json`, but a deserialization failure — an unknown enum
/// variant, a missing field, malformed JSON — is reported through
/// `HttpError` as `INVALID_PARAMETERS` rather than axum's bare-text 422.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| HttpError(ApiError::invalid_parameters(rejection.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Demo {
        value: u32,
    }

    #[tokio::test]
    async fn valid_body_is_extracted() {
        let req = HttpRequest::builder()
            .header("content-type", "application/json")
            .body(Body::from(r#"{"value": 3}"#))
            .unwrap();
        let ValidatedJson(demo) = ValidatedJson::<Demo>::from_request(req, &()).await.unwrap();
        assert_eq!(demo.value, 3);
    }

    #[tokio::test]
    async fn invalid_body_maps_to_invalid_parameters() {
        let req = HttpRequest::builder()
            .header("content-type", "application/json")
            .body(Body::from(r#"{"value": "not a number"}"#))
            .unwrap();
        let err = ValidatedJson::<Demo>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.0.http_status(), 400);
        assert_eq!(err.0.error_code, media_core::error::ErrorCode::InvalidParameters);
    }
}
