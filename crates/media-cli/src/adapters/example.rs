//! A worked, in-tree `ServiceAdapter` (C4) example.
//!
//! Every other service adapter is an out-of-tree crate that implements this
//! same fixed interface (§4.4); this one stands in for them so the
//! interface has a concrete, exercised implementation inside the
//! workspace. It returns fixture data rather than talking to a real
//! streaming service.

use async_trait::async_trait;
use media_core::ports::{Chapter, ServiceAdapter, ServiceAdapterError, Title, Track};

pub struct ExampleAdapter;

impl ExampleAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExampleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceAdapter for ExampleAdapter {
    fn tag(&self) -> &str {
        "EX"
    }

    async fn configure(&self, _config: &serde_json::Value) -> Result<(), ServiceAdapterError> {
        Ok(())
    }

    async fn authenticate(&self, _profile: Option<&str>) -> Result<(), ServiceAdapterError> {
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Title>, ServiceAdapterError> {
        Ok(vec![Title {
            id: format!("EX-{query}"),
            name: format!("Example result for \"{query}\""),
            year: Some(2024),
            is_series: false,
        }])
    }

    async fn get_titles(&self, title_id: &str) -> Result<Vec<Title>, ServiceAdapterError> {
        if title_id.is_empty() {
            return Err(ServiceAdapterError::TitleNotFound(title_id.to_string()));
        }
        Ok(vec![Title {
            id: title_id.to_string(),
            name: format!("Example Title {title_id}"),
            year: Some(2024),
            is_series: title_id.starts_with("SERIES"),
        }])
    }

    async fn get_tracks(&self, title_id: &str) -> Result<Vec<Track>, ServiceAdapterError> {
        let _ = title_id;
        Ok(vec![
            Track {
                id: "video-1080p".to_string(),
                kind: "video".to_string(),
                language: None,
                codec: Some("H264".to_string()),
            },
            Track {
                id: "audio-en".to_string(),
                kind: "audio".to_string(),
                language: Some("en".to_string()),
                codec: Some("AAC".to_string()),
            },
            Track {
                id: "subs-en".to_string(),
                kind: "subtitle".to_string(),
                language: Some("en".to_string()),
                codec: None,
            },
        ])
    }

    async fn get_chapters(&self, title_id: &str) -> Result<Vec<Chapter>, ServiceAdapterError> {
        let _ = title_id;
        Ok(vec![Chapter {
            name: "Opening".to_string(),
            start_ms: 0,
        }])
    }

    async fn get_widevine_license(
        &self,
        title_id: &str,
        challenge: &[u8],
    ) -> Result<Vec<u8>, ServiceAdapterError> {
        let _ = title_id;
        // Fixture "cached_keys" response shape the DRM session manager
        // recognizes (§4.3 `classify_response`), not a real CDM response.
        let body = serde_json::json!({
            "cached_keys": [{"kid": "00000000000000000000000000000001", "key": "11111111111111111111111111111111"}],
        });
        let _ = challenge;
        Ok(serde_json::to_vec(&body).unwrap_or_default())
    }

    async fn get_widevine_service_certificate(
        &self,
        _title_id: &str,
    ) -> Result<Option<Vec<u8>>, ServiceAdapterError> {
        Ok(None)
    }

    async fn get_playready_license(
        &self,
        title_id: &str,
        challenge: &[u8],
    ) -> Result<Vec<u8>, ServiceAdapterError> {
        let _ = (title_id, challenge);
        Err(ServiceAdapterError::ServiceError(
            "example service does not support PlayReady".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_titles_rejects_empty_id() {
        let adapter = ExampleAdapter::new();
        assert!(adapter.get_titles("").await.is_err());
    }

    #[tokio::test]
    async fn get_tracks_returns_one_of_each_kind() {
        let adapter = ExampleAdapter::new();
        let tracks = adapter.get_tracks("T1").await.unwrap();
        assert!(tracks.iter().any(|t| t.kind == "video"));
        assert!(tracks.iter().any(|t| t.kind == "audio"));
        assert!(tracks.iter().any(|t| t.kind == "subtitle"));
    }
}
