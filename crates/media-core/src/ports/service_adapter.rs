//! The service adapter port (C4).
//!
//! A "service" is a content provider (Widevine/PlayReady-protected streaming
//! platform). Each one is fronted by its own adapter crate implementing
//! `ServiceAdapter`; the orchestrator never talks to a service directly.
//!
//! Adapters are looked up by a short tag (`"EX"`, `"NF"`, ...) through a
//! plain keyed registry rather than any form of reflection or dynamic
//! loading — new services are wired in at compile time by registering an
//! `Arc<dyn ServiceAdapter>` under its tag.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceAdapterError {
    #[error("authentication required")]
    AuthRequired,
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("title {0} not found")]
    TitleNotFound(String),
    #[error("content is geofenced in this region")]
    Geofence,
    #[error("upstream service error: {0}")]
    ServiceError(String),
    #[error("upstream network error: {0}")]
    NetworkError(String),
}

/// A title returned by `search` or `get_titles` (§6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Title {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub is_series: bool,
}

/// A single selectable track (video/audio/subtitle) for a title (§6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub id: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

/// A chapter/marker entry for a title (§6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Chapter {
    pub name: String,
    pub start_ms: u64,
}

/// Fixed interface every streaming-service adapter implements (C4).
///
/// `configure` receives this service's slice of `AppConfig::service_config`
/// so credentials/endpoints never need a service-specific field on
/// `AppConfig` itself.
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// Short tag this adapter is registered under, e.g. `"EX"`.
    fn tag(&self) -> &str;

    async fn configure(&self, config: &serde_json::Value) -> Result<(), ServiceAdapterError>;

    async fn authenticate(&self, profile: Option<&str>) -> Result<(), ServiceAdapterError>;

    async fn search(&self, query: &str) -> Result<Vec<Title>, ServiceAdapterError>;

    async fn get_titles(&self, title_id: &str) -> Result<Vec<Title>, ServiceAdapterError>;

    async fn get_tracks(&self, title_id: &str) -> Result<Vec<Track>, ServiceAdapterError>;

    async fn get_chapters(&self, title_id: &str) -> Result<Vec<Chapter>, ServiceAdapterError>;

    /// Raw Widevine license challenge bytes for the given PSSH, returned
    /// as an opaque response blob for the DRM session manager (C3) to parse.
    async fn get_widevine_license(
        &self,
        title_id: &str,
        challenge: &[u8],
    ) -> Result<Vec<u8>, ServiceAdapterError>;

    /// Opaque Widevine service certificate, if this service pins one.
    async fn get_widevine_service_certificate(
        &self,
        title_id: &str,
    ) -> Result<Option<Vec<u8>>, ServiceAdapterError>;

    async fn get_playready_license(
        &self,
        title_id: &str,
        challenge: &[u8],
    ) -> Result<Vec<u8>, ServiceAdapterError>;
}

/// Tag-keyed registry of configured adapters, built once at startup and
/// handed to the scheduler/HTTP layer by `Arc` (§9 "no global singletons").
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    adapters: HashMap<String, Arc<dyn ServiceAdapter>>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ServiceAdapter>) {
        self.adapters.insert(adapter.tag().to_string(), adapter);
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn ServiceAdapter>> {
        self.adapters.get(tag).cloned()
    }

    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.adapters.keys().cloned().collect();
        tags.sort();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubAdapter;

    #[async_trait]
    impl ServiceAdapter for StubAdapter {
        fn tag(&self) -> &str {
            "EX"
        }

        async fn configure(&self, _config: &serde_json::Value) -> Result<(), ServiceAdapterError> {
            Ok(())
        }

        async fn authenticate(&self, _profile: Option<&str>) -> Result<(), ServiceAdapterError> {
            Ok(())
        }

        async fn search(&self, _query: &str) -> Result<Vec<Title>, ServiceAdapterError> {
            Ok(vec![])
        }

        async fn get_titles(&self, title_id: &str) -> Result<Vec<Title>, ServiceAdapterError> {
            Ok(vec![Title {
                id: title_id.to_string(),
                name: "Stub Title".into(),
                year: Some(2020),
                is_series: false,
            }])
        }

        async fn get_tracks(&self, _title_id: &str) -> Result<Vec<Track>, ServiceAdapterError> {
            Ok(vec![])
        }

        async fn get_chapters(&self, _title_id: &str) -> Result<Vec<Chapter>, ServiceAdapterError> {
            Ok(vec![])
        }

        async fn get_widevine_license(
            &self,
            _title_id: &str,
            _challenge: &[u8],
        ) -> Result<Vec<u8>, ServiceAdapterError> {
            Ok(vec![])
        }

        async fn get_widevine_service_certificate(
            &self,
            _title_id: &str,
        ) -> Result<Option<Vec<u8>>, ServiceAdapterError> {
            Ok(None)
        }

        async fn get_playready_license(
            &self,
            _title_id: &str,
            _challenge: &[u8],
        ) -> Result<Vec<u8>, ServiceAdapterError> {
            Ok(vec![])
        }
    }

    #[test]
    fn registry_looks_up_by_tag() {
        let mut registry = ServiceRegistry::new();
        registry.register(Arc::new(StubAdapter));
        assert!(registry.get("EX").is_some());
        assert!(registry.get("NF").is_none());
        assert_eq!(registry.tags(), vec!["EX".to_string()]);
    }

    #[tokio::test]
    async fn stub_adapter_returns_titles() {
        let adapter = StubAdapter;
        let titles = adapter.get_titles("TT001").await.unwrap();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].id, "TT001");
    }
}
