//! Process-wide startup configuration (ambient stack, §1.1/§9 "Global
//! singletons").
//!
//! `AppConfig` is constructed exactly once, at startup, from built-in
//! defaults overridden by an optional TOML file and then by
//! `MEDIAORC_`-prefixed environment variables. It is never a `static`/
//! lazily-initialized global — the composition root builds one and passes
//! it down by `Arc` handle (see `media-cli::bootstrap`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default port the HTTP API (C7) binds to.
pub const DEFAULT_BIND_PORT: u16 = 7979;

/// Default number of concurrent worker slots (C6).
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: u32 = 3;

/// Default job retention window, in hours, before the sweeper removes a
/// terminal job (C6).
pub const DEFAULT_JOB_RETENTION_HOURS: u32 = 24;

/// Process-wide configuration. All fields are optional so a partially
/// specified TOML file or environment overlay can be merged onto
/// `with_defaults()` without clobbering unset fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP API listens on, e.g. `"0.0.0.0:7979"`.
    pub bind_addr: Option<String>,

    /// Number of worker tasks the scheduler runs concurrently (C6).
    pub max_concurrent_downloads: Option<u32>,

    /// Hours a terminal job is kept before the sweeper removes it (C6).
    pub job_retention_hours: Option<u32>,

    /// Root directory for the cache store (C2). Defaults to the platform
    /// cache directory when unset.
    pub cache_root: Option<String>,

    /// Root directory for worker-subprocess temp files (C5). Defaults to
    /// the system temp directory when unset.
    pub temp_root: Option<String>,

    /// When true, `ApiError` responses include `debug_info` (§4.1) and
    /// sensitive fields are NOT redacted from debug logs.
    pub debug_mode: Option<bool>,

    /// Opt-in flag disabling sensitive-field redaction in debug logs (§6).
    /// Independent of `debug_mode` so operators can turn on verbose errors
    /// without also unmasking credentials.
    pub log_keys: Option<bool>,

    /// Vault connection string/path used by the DRM session manager (C3).
    pub vault_url: Option<String>,

    /// Endpoint the health check's update lookup queries for the latest
    /// released version (C9). When unset, `update_available` is always
    /// reported as `null` rather than attempting a network call.
    pub update_check_url: Option<String>,

    /// Opaque per-service adapter configuration blobs, merged into a single
    /// map and handed to `ServiceAdapter::configure` (C4) at registration
    /// time.
    #[serde(default)]
    pub service_config: HashMap<String, serde_json::Value>,
}

impl AppConfig {
    /// Built-in defaults; every `Option` field that has a sensible default
    /// is `Some`.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            bind_addr: Some(format!("0.0.0.0:{DEFAULT_BIND_PORT}")),
            max_concurrent_downloads: Some(DEFAULT_MAX_CONCURRENT_DOWNLOADS),
            job_retention_hours: Some(DEFAULT_JOB_RETENTION_HOURS),
            cache_root: None,
            temp_root: None,
            debug_mode: Some(false),
            log_keys: Some(false),
            vault_url: None,
            update_check_url: None,
            service_config: HashMap::new(),
        }
    }

    #[must_use]
    pub fn effective_max_concurrent_downloads(&self) -> u32 {
        self.max_concurrent_downloads
            .unwrap_or(DEFAULT_MAX_CONCURRENT_DOWNLOADS)
    }

    #[must_use]
    pub fn effective_job_retention_hours(&self) -> u32 {
        self.job_retention_hours.unwrap_or(DEFAULT_JOB_RETENTION_HOURS)
    }

    #[must_use]
    pub fn effective_debug_mode(&self) -> bool {
        self.debug_mode.unwrap_or(false)
    }

    #[must_use]
    pub fn effective_log_keys(&self) -> bool {
        self.log_keys.unwrap_or(false)
    }

    /// Merge a partial update (typically parsed from a TOML file) onto
    /// `self`, only overwriting fields the update actually sets.
    pub fn merge(&mut self, other: &AppConfigUpdate) {
        if let Some(ref v) = other.bind_addr {
            self.bind_addr.clone_from(v);
        }
        if let Some(v) = other.max_concurrent_downloads {
            self.max_concurrent_downloads = v;
        }
        if let Some(v) = other.job_retention_hours {
            self.job_retention_hours = v;
        }
        if let Some(ref v) = other.cache_root {
            self.cache_root.clone_from(v);
        }
        if let Some(ref v) = other.temp_root {
            self.temp_root.clone_from(v);
        }
        if let Some(v) = other.debug_mode {
            self.debug_mode = v;
        }
        if let Some(v) = other.log_keys {
            self.log_keys = v;
        }
        if let Some(ref v) = other.vault_url {
            self.vault_url.clone_from(v);
        }
        if let Some(ref v) = other.update_check_url {
            self.update_check_url.clone_from(v);
        }
        for (key, value) in &other.service_config {
            self.service_config.insert(key.clone(), value.clone());
        }
    }

    /// Overlay `MEDIAORC_`-prefixed environment variables onto `self`. Only
    /// the scalar fields are overridable this way; `service_config` is
    /// TOML/file-only.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MEDIAORC_BIND_ADDR") {
            self.bind_addr = Some(v);
        }
        if let Ok(v) = std::env::var("MEDIAORC_MAX_CONCURRENT_DOWNLOADS") {
            if let Ok(parsed) = v.parse() {
                self.max_concurrent_downloads = Some(parsed);
            }
        }
        if let Ok(v) = std::env::var("MEDIAORC_JOB_RETENTION_HOURS") {
            if let Ok(parsed) = v.parse() {
                self.job_retention_hours = Some(parsed);
            }
        }
        if let Ok(v) = std::env::var("MEDIAORC_CACHE_ROOT") {
            self.cache_root = Some(v);
        }
        if let Ok(v) = std::env::var("MEDIAORC_TEMP_ROOT") {
            self.temp_root = Some(v);
        }
        if let Ok(v) = std::env::var("MEDIAORC_DEBUG_MODE") {
            self.debug_mode = Some(v == "1" || v.eq_ignore_ascii_case("true"));
        }
        if let Ok(v) = std::env::var("MEDIAORC_LOG_KEYS") {
            self.log_keys = Some(v == "1" || v.eq_ignore_ascii_case("true"));
        }
        if let Ok(v) = std::env::var("MEDIAORC_VAULT_URL") {
            self.vault_url = Some(v);
        }
        if let Ok(v) = std::env::var("MEDIAORC_UPDATE_CHECK_URL") {
            self.update_check_url = Some(v);
        }
    }
}

/// Partial `AppConfig` update, as parsed from a TOML config file.
///
/// Each scalar field is `Option<Option<T>>`: `None` = don't change,
/// `Some(None)` = clear, `Some(Some(v))` = set to `v`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfigUpdate {
    pub bind_addr: Option<Option<String>>,
    pub max_concurrent_downloads: Option<Option<u32>>,
    pub job_retention_hours: Option<Option<u32>>,
    pub cache_root: Option<Option<String>>,
    pub temp_root: Option<Option<String>>,
    pub debug_mode: Option<Option<bool>>,
    pub log_keys: Option<Option<bool>>,
    pub vault_url: Option<Option<String>>,
    pub update_check_url: Option<Option<String>>,
    #[serde(default)]
    pub service_config: HashMap<String, serde_json::Value>,
}

/// Config validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("max_concurrent_downloads must be between 1 and 64, got {0}")]
    InvalidConcurrency(u32),

    #[error("job_retention_hours must be at least 1, got {0}")]
    InvalidRetention(u32),

    #[error("bind_addr {0:?} could not be parsed as host:port")]
    InvalidBindAddr(String),
}

/// Validate an `AppConfig`'s values.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(n) = config.max_concurrent_downloads {
        if !(1..=64).contains(&n) {
            return Err(ConfigError::InvalidConcurrency(n));
        }
    }

    if let Some(hours) = config.job_retention_hours {
        if hours == 0 {
            return Err(ConfigError::InvalidRetention(hours));
        }
    }

    if let Some(ref addr) = config.bind_addr {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidBindAddr(addr.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::with_defaults();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let config = AppConfig {
            max_concurrent_downloads: Some(0),
            ..AppConfig::with_defaults()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidConcurrency(0))
        ));
    }

    #[test]
    fn rejects_malformed_bind_addr() {
        let config = AppConfig {
            bind_addr: Some("not-an-addr".to_string()),
            ..AppConfig::with_defaults()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidBindAddr(_))
        ));
    }

    #[test]
    fn merge_only_overwrites_set_fields() {
        let mut config = AppConfig::with_defaults();
        let update = AppConfigUpdate {
            max_concurrent_downloads: Some(Some(8)),
            bind_addr: Some(None),
            ..Default::default()
        };
        config.merge(&update);

        assert_eq!(config.max_concurrent_downloads, Some(8));
        assert_eq!(config.bind_addr, None);
        assert_eq!(
            config.job_retention_hours,
            Some(DEFAULT_JOB_RETENTION_HOURS)
        );
    }

    #[test]
    #[allow(unsafe_code)]
    fn env_overrides_parse_bool_variants() {
        let mut config = AppConfig::with_defaults();
        // SAFETY: test is single-threaded within this process's test harness
        // invocation for this variable; no other test reads/writes it.
        unsafe {
            std::env::set_var("MEDIAORC_DEBUG_MODE", "true");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("MEDIAORC_DEBUG_MODE");
        }
        assert_eq!(config.debug_mode, Some(true));
    }
}
