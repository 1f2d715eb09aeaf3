//! Key-ID normalization (§4.3 "Normalization rule for KIDs").
//!
//! A KID is always stored and compared as lowercase 32-hex with no hyphens.
//! Input is parsed permissively: UUIDs (with hyphens), bare 32-hex, or
//! shorter hex right-padded with zeros to 32 characters.

/// Normalize a raw KID string to canonical lowercase 32-hex form.
///
/// Returns `None` if `raw` contains characters outside `[0-9a-fA-F-]` or is
/// longer than 32 hex digits once hyphens are stripped.
#[must_use]
pub fn normalize_kid(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| *c != '-').collect();
    if stripped.is_empty() || stripped.len() > 32 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let padded = format!("{stripped:0<32}");
    Some(padded.to_lowercase())
}

/// A decryption key as returned by a vault, a service's cached-keys
/// response, or a parsed license (§3 Key).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Key {
    pub kid: String,
    pub key: String,
    #[serde(rename = "type", default = "default_key_type")]
    pub key_type: String,
}

fn default_key_type() -> String {
    "CONTENT".to_string()
}

impl Key {
    #[must_use]
    pub fn new(kid: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kid: kid.into(),
            key: key.into(),
            key_type: default_key_type(),
        }
    }
}

/// Merge `new_keys` into `existing`, skipping any whose normalized kid
/// already has an entry (§4.3 `parse_license` step 5).
pub fn merge_keys_dedup(existing: &mut Vec<Key>, new_keys: impl IntoIterator<Item = Key>) {
    for key in new_keys {
        let already_present = existing.iter().any(|k| k.kid == key.kid);
        if !already_present {
            existing.push(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hyphens_and_lowercases() {
        assert_eq!(
            normalize_kid("AABBCCDD-EEFF-0011-2233-445566778899"),
            Some("aabbccddeeff00112233445566778899".to_string())
        );
    }

    #[test]
    fn right_pads_short_hex() {
        assert_eq!(normalize_kid("abcd"), Some(format!("abcd{}", "0".repeat(28))));
    }

    #[test]
    fn rejects_non_hex_input() {
        assert_eq!(normalize_kid("not-hex-zzzz"), None);
    }

    #[test]
    fn merge_dedups_by_normalized_kid() {
        let mut keys = vec![Key::new("aa", "key1")];
        merge_keys_dedup(&mut keys, vec![Key::new("aa", "key2"), Key::new("bb", "key3")]);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].key, "key1");
    }
}
