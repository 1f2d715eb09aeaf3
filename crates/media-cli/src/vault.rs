//! An in-memory `KeyVault` (C3) seeded with one fixture key.
//!
//! No persistent vault implementation ships in this workspace — a real
//! deployment would back `KeyVault` with a database or flat-file store
//! (§4.3's doc comment on the trait). This one exists so the worked
//! example adapter's DRM round trip can short-circuit at the vault step
//! without depending on network access.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use media_drm::{DrmError, KeyVault};
use media_drm::Key;

pub struct InMemoryVault {
    keys: Mutex<HashMap<String, Key>>,
}

impl InMemoryVault {
    /// A vault pre-seeded with the key the example adapter's titles expect.
    #[must_use]
    pub fn seeded() -> Self {
        let mut keys = HashMap::new();
        let seed = Key::new(
            "00000000000000000000000000000001",
            "11111111111111111111111111111111",
        );
        keys.insert(seed.kid.clone(), seed);
        Self { keys: Mutex::new(keys) }
    }
}

#[async_trait]
impl KeyVault for InMemoryVault {
    async fn get_key(&self, kid: &str) -> Result<Option<Key>, DrmError> {
        Ok(self.keys.lock().unwrap_or_else(|e| e.into_inner()).get(kid).cloned())
    }

    async fn store_keys(&self, keys: &[Key]) -> Result<(), DrmError> {
        let mut guard = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        for key in keys {
            guard.insert(key.kid.clone(), key.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_vault_has_fixture_key() {
        let vault = InMemoryVault::seeded();
        let key = vault.get_key("00000000000000000000000000000001").await.unwrap();
        assert!(key.is_some());
        assert!(vault.get_key("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_keys_overwrites_by_kid() {
        let vault = InMemoryVault::seeded();
        vault
            .store_keys(&[Key::new("00000000000000000000000000000001", "updated")])
            .await
            .unwrap();
        let key = vault.get_key("00000000000000000000000000000001").await.unwrap().unwrap();
        assert_eq!(key.key, "updated");
    }
}
