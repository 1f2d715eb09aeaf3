//! Request/response shaping pipeline for a configurable DRM client (§4.3
//! "Request/response shaping").
//!
//! The DRM client's wire format varies per service, so the request body and
//! response parsing are both driven by a small per-service `ClientConfig`
//! rather than hardcoded field names.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value};

use crate::kid::Key;

/// A field transform, applied in the configured order (§4.3 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Base64Encode,
    Base64Decode,
    HexEncode,
    HexDecode,
    JsonStringify,
    JsonParse,
    /// Parses `kid:key` lines, optionally `--key `-prefixed, into a `Key` array.
    ParseKeyString,
}

/// A tiny `field op value` condition (§4.3 step 4 / response classification).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: ConditionOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    Eq,
    Ne,
    EqNull,
    NeNull,
    Exists,
}

impl Condition {
    #[must_use]
    pub fn evaluate(&self, params: &Map<String, Value>) -> bool {
        let actual = lookup_dotted(params, &self.field);
        match self.op {
            ConditionOp::Exists => actual.is_some(),
            ConditionOp::EqNull => actual.map(Value::is_null).unwrap_or(true),
            ConditionOp::NeNull => actual.is_some_and(|v| !v.is_null()),
            ConditionOp::Eq => actual == self.value.as_ref(),
            ConditionOp::Ne => actual != self.value.as_ref(),
        }
    }
}

/// A static or conditional parameter to merge into the outbound request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConditionalParam {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub when: Vec<Condition>,
}

/// The per-field shaping rules and endpoint/field-mapping configuration for
/// one service's DRM client (§4.3).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ClientConfig {
    /// Renames applied to request keys, e.g. `init_data -> pssh`.
    #[serde(default)]
    pub rename_map: HashMap<String, String>,
    #[serde(default)]
    pub static_params: HashMap<String, Value>,
    #[serde(default)]
    pub conditional_params: Vec<ConditionalParam>,
    /// Transforms applied to named fields, in configured order.
    #[serde(default)]
    pub field_transforms: Vec<(String, Transform)>,
    /// Keys grouped into a nested object under `group_key`.
    #[serde(default)]
    pub grouped_keys: Vec<String>,
    #[serde(default)]
    pub group_key: Option<String>,
    #[serde(default)]
    pub excluded_keys: Vec<String>,

    /// Dotted-path field mapping for response parsing.
    #[serde(default)]
    pub response_field_map: HashMap<String, String>,
    #[serde(default)]
    pub response_types: Vec<(String, Vec<Condition>)>,
    #[serde(default)]
    pub success_conditions: Vec<Condition>,
}

/// Build the outbound request body from base parameters and a `ClientConfig`
/// (§4.3 steps 1-7).
#[must_use]
pub fn build_request_body(base_params: Map<String, Value>, config: &ClientConfig) -> Map<String, Value> {
    let mut body = base_params;

    for (from, to) in &config.rename_map {
        if let Some(value) = body.remove(from) {
            body.insert(to.clone(), value);
        }
    }

    for (key, value) in &config.static_params {
        body.insert(key.clone(), value.clone());
    }

    for param in &config.conditional_params {
        if param.when.iter().all(|cond| cond.evaluate(&body)) {
            body.insert(param.key.clone(), param.value.clone());
        }
    }

    for (field, transform) in &config.field_transforms {
        if let Some(value) = body.get(field).cloned() {
            if let Some(transformed) = apply_transform(*transform, &value) {
                body.insert(field.clone(), transformed);
            }
        }
    }

    if let Some(group_key) = &config.group_key {
        if !config.grouped_keys.is_empty() {
            let mut group = Map::new();
            for key in &config.grouped_keys {
                if let Some(value) = body.remove(key) {
                    group.insert(key.clone(), value);
                }
            }
            body.insert(group_key.clone(), Value::Object(group));
        }
    }

    for key in &config.excluded_keys {
        body.remove(key);
    }

    body
}

fn apply_transform(transform: Transform, value: &Value) -> Option<Value> {
    match transform {
        Transform::Base64Encode => {
            let bytes = value_as_bytes(value)?;
            Some(Value::String(BASE64.encode(bytes)))
        }
        Transform::Base64Decode => {
            let text = value.as_str()?;
            let decoded = BASE64.decode(text).ok()?;
            Some(Value::String(String::from_utf8_lossy(&decoded).into_owned()))
        }
        Transform::HexEncode => {
            let bytes = value_as_bytes(value)?;
            Some(Value::String(hex::encode(bytes)))
        }
        Transform::HexDecode => {
            let text = value.as_str()?;
            let decoded = hex::decode(text).ok()?;
            Some(Value::String(String::from_utf8_lossy(&decoded).into_owned()))
        }
        Transform::JsonStringify => {
            let text = serde_json::to_string(value).ok()?;
            Some(Value::String(text))
        }
        Transform::JsonParse => {
            let text = value.as_str()?;
            serde_json::from_str(text).ok()
        }
        Transform::ParseKeyString => {
            let text = value.as_str()?;
            let keys = parse_key_string(text);
            serde_json::to_value(keys).ok()
        }
    }
}

fn value_as_bytes(value: &Value) -> Option<Vec<u8>> {
    value.as_str().map(|s| s.as_bytes().to_vec())
}

/// Parse `kid:key` lines (optionally `--key `-prefixed) into `Key`s.
#[must_use]
pub fn parse_key_string(text: &str) -> Vec<Key> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim().strip_prefix("--key ").unwrap_or(line.trim());
            let (kid, key) = line.split_once(':')?;
            if kid.is_empty() || key.is_empty() {
                return None;
            }
            Some(Key::new(kid.trim(), key.trim()))
        })
        .collect()
}

/// Look up a dotted path (`a.b.c`) in a JSON object.
#[must_use]
pub fn lookup_dotted<'a>(obj: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = obj.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Classify a parsed response by evaluating `response_types` conditions in
/// order, returning the first matching type name.
#[must_use]
pub fn classify_response(body: &Map<String, Value>, config: &ClientConfig) -> Option<String> {
    config
        .response_types
        .iter()
        .find(|(_, conditions)| conditions.iter().all(|c| c.evaluate(body)))
        .map(|(name, _)| name.clone())
}

/// Evaluate `success_conditions` as an AND (§4.3 "Failure semantics").
#[must_use]
pub fn is_success(body: &Map<String, Value>, config: &ClientConfig) -> bool {
    config.success_conditions.iter().all(|c| c.evaluate(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_map_moves_values() {
        let mut config = ClientConfig::default();
        config.rename_map.insert("init_data".into(), "pssh".into());
        let mut base = Map::new();
        base.insert("init_data".into(), Value::String("abc".into()));

        let body = build_request_body(base, &config);
        assert_eq!(body.get("pssh"), Some(&Value::String("abc".into())));
        assert!(!body.contains_key("init_data"));
    }

    #[test]
    fn conditional_param_only_added_when_condition_holds() {
        let mut config = ClientConfig::default();
        config.conditional_params.push(ConditionalParam {
            key: "cert".into(),
            value: Value::String("present".into()),
            when: vec![Condition {
                field: "certificate".into(),
                op: ConditionOp::NeNull,
                value: None,
            }],
        });

        let mut with_cert = Map::new();
        with_cert.insert("certificate".into(), Value::String("x".into()));
        let body = build_request_body(with_cert, &config);
        assert_eq!(body.get("cert"), Some(&Value::String("present".into())));

        let without_cert = Map::new();
        let body = build_request_body(without_cert, &config);
        assert!(!body.contains_key("cert"));
    }

    #[test]
    fn parse_key_string_handles_dashdash_key_prefix() {
        let keys = parse_key_string("--key aa:1111\nbb:2222");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].kid, "aa");
        assert_eq!(keys[1].key, "2222");
    }

    #[test]
    fn lookup_dotted_path_traverses_nested_objects() {
        let mut inner = Map::new();
        inner.insert("b".into(), Value::String("found".into()));
        let mut obj = Map::new();
        obj.insert("a".into(), Value::Object(inner));

        assert_eq!(lookup_dotted(&obj, "a.b"), Some(&Value::String("found".into())));
        assert_eq!(lookup_dotted(&obj, "a.missing"), None);
    }

    #[test]
    fn success_conditions_require_all_true() {
        let config = ClientConfig {
            success_conditions: vec![
                Condition {
                    field: "ok".into(),
                    op: ConditionOp::Eq,
                    value: Some(Value::Bool(true)),
                },
                Condition {
                    field: "error".into(),
                    op: ConditionOp::EqNull,
                    value: None,
                },
            ],
            ..ClientConfig::default()
        };

        let mut body = Map::new();
        body.insert("ok".into(), Value::Bool(true));
        assert!(is_success(&body, &config));

        body.insert("error".into(), Value::String("boom".into()));
        assert!(!is_success(&body, &config));
    }
}
