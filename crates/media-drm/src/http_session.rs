//! A retrying HTTP session shared by every outbound DRM call (§4.3 ADDED).
//!
//! Exponential backoff with jitter, `Retry-After` honored when present, a
//! configurable status forcelist, and a distinct "max retries exceeded"
//! failure once the retry budget is spent.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Method, Response, StatusCode};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub max_backoff: Duration,
    pub status_forcelist: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            backoff_factor: 0.2,
            max_backoff: Duration::from_secs(60),
            status_forcelist: vec![
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("max retries exceeded for {method} {url}: {cause}")]
    MaxRetriesExceeded {
        method: String,
        url: String,
        cause: String,
    },
}

/// An HTTP client paired with a `RetryPolicy`, used for every DRM-related
/// outbound request (`get_request`, `decrypt_response`, and any future
/// call the DRM client makes).
pub struct RetryingSession {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingSession {
    #[must_use]
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn request(
        &self,
        method: Method,
        url: &str,
        build: impl Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<Response, SessionError> {
        let mut last_error: Option<String> = None;

        for attempt in 0..=self.policy.max_retries {
            let request = build(self.client.request(method.clone(), url));
            match request.send().await {
                Ok(response) if !self.policy.status_forcelist.contains(&response.status()) => {
                    return Ok(response);
                }
                Ok(response) => {
                    let sleep_time = Self::sleep_time_from_response(&response, attempt + 1, &self.policy);
                    last_error = Some(format!("received status code: {}", response.status()));
                    if attempt < self.policy.max_retries {
                        tokio::time::sleep(sleep_time).await;
                    }
                }
                Err(err) => {
                    last_error = Some(err.to_string());
                    if attempt < self.policy.max_retries {
                        let sleep_time = Self::backoff_for_attempt(attempt + 1, &self.policy);
                        tokio::time::sleep(sleep_time).await;
                    }
                }
            }
        }

        Err(SessionError::MaxRetriesExceeded {
            method: method.to_string(),
            url: url.to_string(),
            cause: last_error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    fn sleep_time_from_response(response: &Response, attempt: u32, policy: &RetryPolicy) -> Duration {
        if let Some(retry_after) = response.headers().get("Retry-After") {
            if let Ok(text) = retry_after.to_str() {
                if let Ok(secs) = text.parse::<f64>() {
                    return Duration::from_secs_f64(secs.max(0.0));
                }
                if let Ok(date) = chrono::DateTime::parse_from_rfc2822(text) {
                    let delta = date.signed_duration_since(chrono::Utc::now());
                    return delta.to_std().unwrap_or(Duration::ZERO);
                }
            }
        }
        Self::backoff_for_attempt(attempt, policy)
    }

    fn backoff_for_attempt(attempt: u32, policy: &RetryPolicy) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let backoff = policy.backoff_factor * 2f64.powi(i32::try_from(attempt - 1).unwrap_or(i32::MAX));
        let jitter_bound = backoff * 0.1;
        let jitter = rand::thread_rng().gen_range(-jitter_bound..=jitter_bound);
        let sleep_secs = (backoff + jitter).max(0.0).min(policy.max_backoff.as_secs_f64());
        Duration::from_secs_f64(sleep_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_and_is_capped() {
        let policy = RetryPolicy {
            backoff_factor: 1.0,
            max_backoff: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        let first = RetryingSession::backoff_for_attempt(1, &policy);
        let third = RetryingSession::backoff_for_attempt(3, &policy);
        assert!(first.as_secs_f64() < third.as_secs_f64());
        assert!(third <= Duration::from_secs(5));
    }

    #[test]
    fn zeroth_attempt_has_no_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(RetryingSession::backoff_for_attempt(0, &policy), Duration::ZERO);
    }
}
