//! Keyed, expiring, checksum-verified blob cache (component C2).
//!
//! Per §9's design note, `Cache` is a pure value type that re-reads its file
//! from disk on each access rather than a per-(service, key, version)
//! multiton kept alive in a locked map. Disk is already the source of
//! truth, so the multiton buys nothing but complexity here.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by cache read/write operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache entry for {service}/{key} is corrupt: checksum mismatch")]
    ChecksumMismatch { service: String, key: String },

    #[error("cache entry for {service}/{key} has version {found}, expected {expected}")]
    VersionMismatch {
        service: String,
        key: String,
        found: u32,
        expected: u32,
    },

    #[error("failed to read cache entry at {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write cache entry at {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("failed to serialize cache payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// On-disk payload shape (§3 Cache Entry). `crc32` covers the serialization
/// of `data`, `expiration` and `version` — in that field order — so it can
/// be recomputed the same way on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachePayload {
    data: serde_json::Value,
    expiration: Option<DateTime<Utc>>,
    version: u32,
    crc32: u32,
}

fn checksum_of(data: &serde_json::Value, expiration: Option<DateTime<Utc>>, version: u32) -> Result<u32, CacheError> {
    #[derive(Serialize)]
    struct Checksummed<'a> {
        data: &'a serde_json::Value,
        expiration: Option<DateTime<Utc>>,
        version: u32,
    }
    let bytes = serde_json::to_vec(&Checksummed {
        data,
        expiration,
        version,
    })?;
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize())
}

/// A single cache entry, identified by `(service, key, version)` and backed
/// by `<cache_root>/<service>/<key>.json`.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
    service: String,
    key: String,
    version: u32,
}

/// Result of a successful `Cache::get`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: serde_json::Value,
    pub expiration: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// True iff `expiration` is set and in the past.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expiration.is_some_and(|exp| exp < Utc::now())
    }
}

impl Cache {
    /// Open a handle for `(service, key)` at the given cache root, expecting
    /// entries written at schema `version`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, service: impl Into<String>, key: impl Into<String>, version: u32) -> Self {
        Self {
            root: root.into(),
            service: service.into(),
            key: key.into(),
            version,
        }
    }

    fn path(&self) -> PathBuf {
        self.root.join(&self.service).join(format!("{}.json", self.key))
    }

    /// Read and validate the entry. Returns `Ok(None)` if no file exists yet.
    pub fn get(&self) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| CacheError::ReadFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let payload: CachePayload = serde_json::from_str(&raw)?;

        let expected_crc = checksum_of(&payload.data, payload.expiration, payload.version)?;
        if expected_crc != payload.crc32 {
            return Err(CacheError::ChecksumMismatch {
                service: self.service.clone(),
                key: self.key.clone(),
            });
        }
        if payload.version != self.version {
            return Err(CacheError::VersionMismatch {
                service: self.service.clone(),
                key: self.key.clone(),
                found: payload.version,
                expected: self.version,
            });
        }

        Ok(Some(CacheEntry {
            data: payload.data,
            expiration: payload.expiration,
        }))
    }

    /// Write `data` with an explicit expiration, overwriting any existing
    /// entry atomically (write to a sibling temp file, then rename).
    ///
    /// If `expiration` is `None`, `data` is attempted as a JWT and its `exp`
    /// claim is used instead; any failure to decode falls through to no
    /// expiration at all (§3 "If no expiration supplied, attempt to parse
    /// `data` as a JWT and use its `exp` claim; otherwise null").
    pub fn set(&self, data: serde_json::Value, expiration: Option<DateTime<Utc>>) -> Result<(), CacheError> {
        let expiration = expiration.or_else(|| jwt_exp_claim(&data));

        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::WriteFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }

        let crc32 = checksum_of(&data, expiration, self.version)?;
        let payload = CachePayload {
            data,
            expiration,
            version: self.version,
            crc32,
        };
        let serialized = serde_json::to_vec_pretty(&payload)?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &serialized).map_err(|e| CacheError::WriteFailed {
            path: tmp_path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| CacheError::WriteFailed {
            path,
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Delete the entry, if present. A missing file is not an error.
    pub fn invalidate(&self) -> Result<(), CacheError> {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::WriteFailed {
                path,
                reason: e.to_string(),
            }),
        }
    }
}

/// Best-effort extraction of the `exp` claim from `data` when it's a JWT
/// string. Signature verification is deliberately skipped, matching the
/// source's own `verify_signature=False` decode — this is an expiration
/// hint, not an authentication check. Any shape mismatch (not a string, not
/// three dot-separated segments, non-base64url payload, missing/non-numeric
/// `exp`) returns `None` rather than an error.
fn jwt_exp_claim(data: &serde_json::Value) -> Option<DateTime<Utc>> {
    let token = data.as_str()?;
    let payload_segment = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload_segment).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_f64()?;
    parse_expiration(&ExpirationInput::Number(exp))
}

/// Parse an expiration timestamp the way the source cache does.
///
/// Accepts a native datetime (passed through), an ISO-8601 string (with or
/// without a trailing `Z`), an integer/float number of seconds, or a
/// 13-digit integer treated as milliseconds. **Deliberately preserved
/// quirk** (§9 Open Question): if the resolved timestamp is in the past, it
/// is reinterpreted as a duration in seconds *from now* rather than an
/// absolute instant. This is ambiguous and may mask bugs where a stale
/// expiration silently gets extended — it is not fixed here because the
/// spec directs us to document, not guess a fix for, this behavior.
#[must_use]
pub fn parse_expiration(raw: &ExpirationInput) -> Option<DateTime<Utc>> {
    let now = Utc::now();
    let resolved = match raw {
        ExpirationInput::DateTime(dt) => Some(*dt),
        ExpirationInput::Iso8601(s) => {
            let trimmed = s.strip_suffix('Z').unwrap_or(s);
            DateTime::parse_from_rfc3339(trimmed)
                .or_else(|_| DateTime::parse_from_rfc3339(&format!("{trimmed}+00:00")))
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }
        ExpirationInput::Seconds(secs) => {
            DateTime::from_timestamp(secs.trunc() as i64, 0)
        }
        ExpirationInput::Number(n) => {
            // 13-digit magnitude is treated as milliseconds since epoch.
            if n.abs() >= 1_000_000_000_000.0 {
                DateTime::from_timestamp_millis(*n as i64)
            } else {
                DateTime::from_timestamp(*n as i64, 0)
            }
        }
        ExpirationInput::NumericString(s) => {
            s.parse::<f64>().ok().and_then(|n| {
                if n.abs() >= 1_000_000_000_000.0 {
                    DateTime::from_timestamp_millis(n as i64)
                } else {
                    DateTime::from_timestamp(n as i64, 0)
                }
            })
        }
    }?;

    if resolved < now {
        // Preserved ambiguity: treat a past timestamp as "seconds from now".
        let seconds = resolved.timestamp();
        Some(now + chrono::Duration::seconds(seconds))
    } else {
        Some(resolved)
    }
}

/// Recognized shapes for an externally-supplied expiration value.
#[derive(Debug, Clone)]
pub enum ExpirationInput {
    DateTime(DateTime<Utc>),
    Iso8601(String),
    Seconds(f64),
    Number(f64),
    NumericString(String),
}
