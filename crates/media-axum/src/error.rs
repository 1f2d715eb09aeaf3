//! Axum-specific error mapping.
//!
//! The API layer exclusively maps domain-level `ApiError`s to HTTP
//! responses (§4.7) — handlers never write raw status codes themselves.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use media_core::error::{ApiError, ErrorCode};
use media_core::params::ParameterError;
use media_core::ports::ServiceAdapterError;
use media_core::proxy::ProxyError;

/// Newtype wrapping `ApiError` so it can implement `IntoResponse` here
/// without `media-core` depending on axum.
#[derive(Debug)]
pub struct HttpError(pub ApiError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<ParameterError> for HttpError {
    fn from(err: ParameterError) -> Self {
        Self(ApiError::invalid_parameters(err.to_string()))
    }
}

impl From<ProxyError> for HttpError {
    fn from(err: ProxyError) -> Self {
        Self(ApiError::new(ErrorCode::InvalidProxy, err.to_string()))
    }
}

impl From<ServiceAdapterError> for HttpError {
    fn from(err: ServiceAdapterError) -> Self {
        let code = match &err {
            ServiceAdapterError::AuthRequired => ErrorCode::AuthRequired,
            ServiceAdapterError::AuthFailed(_) => ErrorCode::AuthFailed,
            ServiceAdapterError::TitleNotFound(_) => ErrorCode::NotFound,
            ServiceAdapterError::Geofence => ErrorCode::Geofence,
            ServiceAdapterError::ServiceError(_) => ErrorCode::ServiceError,
            ServiceAdapterError::NetworkError(_) => ErrorCode::NetworkError,
        };
        Self(ApiError::new(code, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_not_found_maps_to_404() {
        let err: HttpError = ServiceAdapterError::TitleNotFound("TT001".into()).into();
        assert_eq!(err.0.http_status(), 404);
    }

    #[test]
    fn parameter_error_maps_to_400() {
        let err: HttpError = ParameterError::MissingService.into();
        assert_eq!(err.0.http_status(), 400);
    }
}
