//! The DRM session manager (C3, §4.3) — the licensing algorithm.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Method;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::AuthStrategy;
use crate::error::DrmError;
use crate::http_session::RetryingSession;
use crate::kid::{Key, merge_keys_dedup, normalize_kid};
use crate::shaping::{ClientConfig, build_request_body, classify_response, is_success, lookup_dotted};
use crate::vault::{KeyVault, is_zero_key};

/// Opaque session handle, 16 random bytes per §4.3 `open()`.
pub type SessionId = [u8; 16];

#[must_use]
pub fn format_session_id(id: SessionId) -> String {
    hex::encode(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseType {
    Streaming,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyMode {
    Enabled,
    Disabled,
}

#[derive(Debug, Default)]
struct SessionState {
    pssh: Option<Vec<u8>>,
    init_data_b64: Option<String>,
    service_certificate: Option<Vec<u8>>,
    required_kids: Vec<String>,
    vault_keys: Vec<Key>,
    cached_keys: Vec<Key>,
    keys: Vec<Key>,
    challenge: Option<Vec<u8>>,
    remote_session_id: Option<String>,
}

/// Per-service DRM client wiring: endpoints, auth, and wire shaping.
#[derive(Debug, Clone)]
pub struct DrmClientConfig {
    pub get_request_url: String,
    pub decrypt_response_url: String,
    pub auth: AuthStrategy,
    pub device_scheme: String,
    pub service_name: String,
    pub request_shaping: ClientConfig,
    /// Installed when `set_service_certificate(None)` is called and the
    /// device profile expects a common-privacy-cert fallback.
    pub common_privacy_cert: Option<Vec<u8>>,
}

pub struct DrmSessionManager {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
    vault: Option<Arc<dyn KeyVault>>,
    http: RetryingSession,
    config: DrmClientConfig,
}

impl DrmSessionManager {
    #[must_use]
    pub fn new(config: DrmClientConfig, http: RetryingSession, vault: Option<Arc<dyn KeyVault>>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            vault,
            http,
            config,
        }
    }

    pub async fn open(&self) -> SessionId {
        let id = *Uuid::new_v4().as_bytes();
        self.sessions.lock().await.insert(id, SessionState::default());
        tracing::debug!(session_id = %format_session_id(id), "drm session opened");
        id
    }

    pub async fn close(&self, session_id: SessionId) -> Result<(), DrmError> {
        let removed = self.sessions.lock().await.remove(&session_id);
        if removed.is_some() {
            tracing::debug!(session_id = %format_session_id(session_id), "drm session closed");
        }
        removed.map(|_| ()).ok_or(DrmError::InvalidSession)
    }

    pub async fn set_service_certificate(
        &self,
        session_id: SessionId,
        cert: Option<Vec<u8>>,
    ) -> Result<(), DrmError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&session_id).ok_or(DrmError::InvalidSession)?;
        session.service_certificate = cert.or_else(|| self.config.common_privacy_cert.clone());
        Ok(())
    }

    pub async fn set_required_kids(&self, session_id: SessionId, kids: &[String]) -> Result<(), DrmError> {
        let normalized: Vec<String> = kids.iter().filter_map(|k| normalize_kid(k)).collect();
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&session_id).ok_or(DrmError::InvalidSession)?;
        session.required_kids = normalized;
        Ok(())
    }

    pub async fn has_cached_keys(&self, session_id: SessionId) -> Result<bool, DrmError> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&session_id).ok_or(DrmError::InvalidSession)?;
        Ok(!session.cached_keys.is_empty())
    }

    pub async fn get_keys(&self, session_id: SessionId, kind_filter: Option<&str>) -> Result<Vec<Key>, DrmError> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&session_id).ok_or(DrmError::InvalidSession)?;
        Ok(session
            .keys
            .iter()
            .filter(|k| kind_filter.is_none_or(|kind| k.key_type.eq_ignore_ascii_case(kind)))
            .cloned()
            .collect())
    }

    /// §4.3 `get_license_challenge`.
    pub async fn get_license_challenge(
        &self,
        session_id: SessionId,
        pssh: &[u8],
        _license_type: LicenseType,
        _privacy_mode: PrivacyMode,
    ) -> Result<Vec<u8>, DrmError> {
        let init_data_b64 = BASE64.encode(pssh);

        {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(&session_id).ok_or(DrmError::InvalidSession)?;
            session.pssh = Some(pssh.to_vec());
            session.init_data_b64 = Some(init_data_b64.clone());
        }

        if let Some(vault) = &self.vault {
            let required_kids = {
                let sessions = self.sessions.lock().await;
                sessions.get(&session_id).ok_or(DrmError::InvalidSession)?.required_kids.clone()
            };

            if !required_kids.is_empty() {
                let mut vault_keys = Vec::new();
                for kid in &required_kids {
                    if let Some(key) = vault.get_key(kid).await? {
                        if !is_zero_key(&key.key) {
                            vault_keys.push(key);
                        }
                    }
                }

                let vault_kids: Vec<&str> = vault_keys.iter().map(|k| k.kid.as_str()).collect();
                let satisfied = required_kids.iter().all(|k| vault_kids.contains(&k.as_str()));

                let mut sessions = self.sessions.lock().await;
                let session = sessions.get_mut(&session_id).ok_or(DrmError::InvalidSession)?;
                if satisfied {
                    session.keys = vault_keys;
                    return Ok(Vec::new());
                }
                session.vault_keys = vault_keys;
            }
        }

        let base_params = self.build_base_params(session_id).await?;
        let body = build_request_body(base_params, &self.config.request_shaping);

        let response_body = self.post_json(&self.config.get_request_url.clone(), body).await?;

        if !is_success(&response_body, &self.config.request_shaping) {
            return Err(DrmError::RequestFailed(collect_error_text(&response_body)));
        }

        match classify_response(&response_body, &self.config.request_shaping).as_deref() {
            Some("cached_keys") => self.handle_cached_keys(session_id, &response_body).await,
            Some("license_required") => self.handle_license_required(session_id, &response_body).await,
            other => {
                tracing::warn!(?other, "unrecognized DRM response shape");
                Err(DrmError::RequestFailed(format!(
                    "unrecognized response shape: {other:?}"
                )))
            }
        }
    }

    async fn handle_cached_keys(&self, session_id: SessionId, response: &Map<String, Value>) -> Result<Vec<u8>, DrmError> {
        let cached_keys = extract_keys(response, &self.config.request_shaping, "cached_keys");

        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&session_id).ok_or(DrmError::InvalidSession)?;

        let mut all_available = cached_keys.clone();
        merge_keys_dedup(&mut all_available, session.vault_keys.clone());

        let satisfied = !session.required_kids.is_empty()
            && session
                .required_kids
                .iter()
                .all(|kid| all_available.iter().any(|k| &k.kid == kid));

        if satisfied {
            session.keys = all_available;
            return Ok(Vec::new());
        }

        session.cached_keys = cached_keys;
        Err(DrmError::RequestFailed(
            "cached keys incomplete and no license challenge available".to_string(),
        ))
    }

    async fn handle_license_required(&self, session_id: SessionId, response: &Map<String, Value>) -> Result<Vec<u8>, DrmError> {
        let challenge = extract_bytes_field(response, &self.config.request_shaping, "challenge")
            .ok_or_else(|| DrmError::RequestFailed("missing challenge in response".to_string()))?;
        let remote_session_id = extract_string_field(response, &self.config.request_shaping, "remote_session_id")
            .ok_or_else(|| DrmError::RequestFailed("missing remote_session_id in response".to_string()))?;

        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&session_id).ok_or(DrmError::InvalidSession)?;
        session.challenge = Some(challenge.clone());
        session.remote_session_id = Some(remote_session_id);
        Ok(challenge)
    }

    /// §4.3 `parse_license`.
    pub async fn parse_license(&self, session_id: SessionId, license_message: &[u8]) -> Result<(), DrmError> {
        {
            let sessions = self.sessions.lock().await;
            let session = sessions.get(&session_id).ok_or(DrmError::InvalidSession)?;
            if !session.keys.is_empty() && session.cached_keys.is_empty() {
                return Ok(());
            }
        }

        let (challenge, remote_session_id, init_data) = {
            let sessions = self.sessions.lock().await;
            let session = sessions.get(&session_id).ok_or(DrmError::InvalidSession)?;
            let challenge = session.challenge.clone().ok_or(DrmError::NoChallengeIssued)?;
            let remote_session_id = session
                .remote_session_id
                .clone()
                .ok_or(DrmError::NoChallengeIssued)?;
            (challenge, remote_session_id, session.init_data_b64.clone())
        };

        let mut body = Map::new();
        body.insert("scheme".into(), Value::String(self.config.device_scheme.clone()));
        body.insert("remote_session_id".into(), Value::String(remote_session_id));
        if let Some(init_data) = init_data {
            body.insert("init_data".into(), Value::String(init_data));
        }
        body.insert("challenge".into(), Value::String(BASE64.encode(&challenge)));
        body.insert(
            "license_message".into(),
            Value::String(BASE64.encode(license_message)),
        );

        let response_body = self.post_json(&self.config.decrypt_response_url.clone(), body).await?;

        if !is_success(&response_body, &self.config.request_shaping) {
            return Err(DrmError::RequestFailed(collect_error_text(&response_body)));
        }

        let license_keys = extract_keys(&response_body, &self.config.request_shaping, "license_keys");

        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&session_id).ok_or(DrmError::InvalidSession)?;

        let mut all_keys = session.vault_keys.clone();
        merge_keys_dedup(&mut all_keys, session.cached_keys.clone());
        merge_keys_dedup(&mut all_keys, license_keys);

        session.keys.clone_from(&all_keys);
        session.cached_keys.clear();
        session.vault_keys.clear();
        drop(sessions);

        if let Some(vault) = &self.vault {
            vault.store_keys(&content_keys_only(&all_keys)).await?;
        }

        Ok(())
    }

    async fn build_base_params(&self, session_id: SessionId) -> Result<Map<String, Value>, DrmError> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&session_id).ok_or(DrmError::InvalidSession)?;

        let mut params = Map::new();
        params.insert(
            "init_data".into(),
            Value::String(session.init_data_b64.clone().unwrap_or_default()),
        );
        params.insert("scheme".into(), Value::String(self.config.device_scheme.clone()));
        params.insert("service".into(), Value::String(self.config.service_name.clone()));
        params.insert(
            "certificate".into(),
            session
                .service_certificate
                .as_ref()
                .map_or(Value::Null, |cert| Value::String(BASE64.encode(cert))),
        );
        Ok(params)
    }

    async fn post_json(&self, url: &str, mut body: Map<String, Value>) -> Result<Map<String, Value>, DrmError> {
        self.config.auth.apply_to_body(&mut body);

        let response = self
            .http
            .request(Method::POST, url, |builder| {
                let builder = self.config.auth.apply_to_request(builder);
                builder.json(&body)
            })
            .await
            .map_err(|e| DrmError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DrmError::RequestFailed(format!(
                "non-200 response: {}",
                response.status()
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| DrmError::RequestFailed(e.to_string()))?;
        parsed
            .as_object()
            .cloned()
            .ok_or_else(|| DrmError::RequestFailed("response was not a JSON object".to_string()))
    }
}

fn extract_string_field(response: &Map<String, Value>, config: &ClientConfig, name: &str) -> Option<String> {
    let path = config.response_field_map.get(name).map_or(name, String::as_str);
    lookup_dotted(response, path).and_then(|v| v.as_str()).map(str::to_string)
}

fn extract_bytes_field(response: &Map<String, Value>, config: &ClientConfig, name: &str) -> Option<Vec<u8>> {
    let text = extract_string_field(response, config, name)?;
    BASE64.decode(text).ok()
}

fn extract_keys(response: &Map<String, Value>, config: &ClientConfig, name: &str) -> Vec<Key> {
    let path = config.response_field_map.get(name).map_or(name, String::as_str);
    let Some(value) = lookup_dotted(response, path) else {
        return Vec::new();
    };
    let raw: Vec<Key> = serde_json::from_value(value.clone()).unwrap_or_default();
    raw.into_iter()
        .filter_map(|mut key| {
            key.kid = normalize_kid(&key.kid)?;
            Some(key)
        })
        .collect()
}

/// The vault is a caching layer for content keys (§3 Key: "only Content
/// participates in caching") — key types such as `TEMPORARY` are dropped
/// before persistence.
fn content_keys_only(keys: &[Key]) -> Vec<Key> {
    keys.iter()
        .filter(|k| k.key_type.eq_ignore_ascii_case("CONTENT"))
        .cloned()
        .collect()
}

fn collect_error_text(response: &Map<String, Value>) -> String {
    response
        .get("error")
        .or_else(|| response.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown DRM error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::KeyVault;
    use async_trait::async_trait;

    struct NoopVault;

    #[async_trait]
    impl KeyVault for NoopVault {
        async fn get_key(&self, _kid: &str) -> Result<Option<Key>, DrmError> {
            Ok(None)
        }
        async fn store_keys(&self, _keys: &[Key]) -> Result<(), DrmError> {
            Ok(())
        }
    }

    fn manager() -> DrmSessionManager {
        let http = RetryingSession::new(reqwest::Client::new(), crate::http_session::RetryPolicy::default());
        let config = DrmClientConfig {
            get_request_url: "http://example.invalid/get".into(),
            decrypt_response_url: "http://example.invalid/decrypt".into(),
            auth: AuthStrategy::Bearer { token: "tok".into() },
            device_scheme: "widevine".into(),
            service_name: "EX".into(),
            request_shaping: ClientConfig::default(),
            common_privacy_cert: None,
        };
        DrmSessionManager::new(config, http, Some(Arc::new(NoopVault)))
    }

    #[tokio::test]
    async fn open_then_close_round_trips() {
        let manager = manager();
        let id = manager.open().await;
        assert!(manager.close(id).await.is_ok());
    }

    #[tokio::test]
    async fn closing_unknown_session_fails() {
        let manager = manager();
        let result = manager.close([0u8; 16]).await;
        assert!(matches!(result, Err(DrmError::InvalidSession)));
    }

    #[tokio::test]
    async fn required_kids_are_normalized_on_set() {
        let manager = manager();
        let id = manager.open().await;
        manager
            .set_required_kids(id, &["AABB-CCDD".to_string()])
            .await
            .unwrap();
        let sessions = manager.sessions.lock().await;
        assert_eq!(sessions[&id].required_kids[0], normalize_kid("AABB-CCDD").unwrap());
    }

    #[tokio::test]
    async fn no_cached_keys_initially() {
        let manager = manager();
        let id = manager.open().await;
        assert!(!manager.has_cached_keys(id).await.unwrap());
    }

    #[tokio::test]
    async fn get_keys_filters_by_kind() {
        let manager = manager();
        let id = manager.open().await;
        {
            let mut sessions = manager.sessions.lock().await;
            let session = sessions.get_mut(&id).unwrap();
            session.keys.push(Key::new("aa", "key1"));
            let mut temp_key = Key::new("bb", "key2");
            temp_key.key_type = "TEMPORARY".into();
            session.keys.push(temp_key);
        }
        let content_keys = manager.get_keys(id, Some("CONTENT")).await.unwrap();
        assert_eq!(content_keys.len(), 1);
        assert_eq!(content_keys[0].kid, "aa");
    }

    #[tokio::test]
    async fn parse_license_is_noop_when_keys_already_complete() {
        let manager = manager();
        let id = manager.open().await;
        {
            let mut sessions = manager.sessions.lock().await;
            sessions.get_mut(&id).unwrap().keys.push(Key::new("aa", "k"));
        }
        assert!(manager.parse_license(id, b"ignored").await.is_ok());
    }

    #[tokio::test]
    async fn parse_license_fails_without_a_prior_challenge() {
        let manager = manager();
        let id = manager.open().await;
        let result = manager.parse_license(id, b"msg").await;
        assert!(matches!(result, Err(DrmError::NoChallengeIssued)));
    }

    #[test]
    fn extract_keys_normalizes_kid_from_response() {
        let mut response = Map::new();
        response.insert(
            "cached_keys".into(),
            serde_json::json!([{"kid": "AABB-CCDD", "key": "k1"}]),
        );
        let keys = extract_keys(&response, &ClientConfig::default(), "cached_keys");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].kid, normalize_kid("AABB-CCDD").unwrap());
    }

    #[test]
    fn extract_keys_drops_entries_with_unparsable_kid() {
        let mut response = Map::new();
        response.insert(
            "cached_keys".into(),
            serde_json::json!([{"kid": "not-hex-zzzz", "key": "k1"}, {"kid": "aa", "key": "k2"}]),
        );
        let keys = extract_keys(&response, &ClientConfig::default(), "cached_keys");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].key, "k2");
    }

    #[test]
    fn content_keys_only_drops_non_content_key_types() {
        let mut temp_key = Key::new("bb", "tempkey");
        temp_key.key_type = "TEMPORARY".into();
        let content_key = Key::new("aa", "contentkey");

        let filtered = content_keys_only(&[content_key.clone(), temp_key]);
        assert_eq!(filtered, vec![content_key]);
    }
}
