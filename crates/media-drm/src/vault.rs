//! The local key vault port (§4.3 "a local vault is configured").
//!
//! The vault is a cache of previously acquired content keys, queried before
//! issuing a license challenge and written back to after a successful
//! license parse. It is deliberately a trait here, not a concrete store —
//! the pack's examples implement vaults as anything from a SQLite table to
//! a flat file, and that choice doesn't belong in the session manager.

use async_trait::async_trait;

use crate::error::DrmError;
use crate::kid::Key;

#[async_trait]
pub trait KeyVault: Send + Sync {
    /// Look up a single key by its normalized KID. A zero/all-0x00 key is
    /// treated by callers as "not present" per §4.3 step 2.
    async fn get_key(&self, kid: &str) -> Result<Option<Key>, DrmError>;

    /// Persist content keys after a successful license parse (§4.3 step 7).
    async fn store_keys(&self, keys: &[Key]) -> Result<(), DrmError>;
}

/// A key consisting of all zero bytes is treated as absent (§4.3 step 2).
#[must_use]
pub fn is_zero_key(key_hex: &str) -> bool {
    !key_hex.is_empty() && key_hex.chars().all(|c| c == '0')
}
