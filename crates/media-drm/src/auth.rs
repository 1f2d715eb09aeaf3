//! Outbound request authentication strategies (§4.3 "Authentication strategies").

use reqwest::RequestBuilder;
use serde_json::{Map, Value};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthStrategy {
    Header { name: String, value: String },
    Bearer { token: String },
    Basic { username: String, password: String },
    Query { name: String, value: String },
    Body { key: String, value: Value },
}

impl AuthStrategy {
    /// Apply this strategy to an outbound request builder and/or body.
    /// `Query` and `Body` strategies mutate `body`/the URL via the returned
    /// builder; callers append query params before sending.
    #[must_use]
    pub fn apply_to_request(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Header { name, value } => builder.header(name, value),
            Self::Bearer { token } => builder.bearer_auth(token),
            Self::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Self::Query { name, value } => builder.query(&[(name, value)]),
            Self::Body { .. } => builder,
        }
    }

    /// Apply a `Body` strategy by merging a key into the request body; a
    /// no-op for every other strategy.
    pub fn apply_to_body(&self, body: &mut Map<String, Value>) {
        if let Self::Body { key, value } = self {
            body.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_strategy_inserts_key() {
        let strategy = AuthStrategy::Body {
            key: "api_key".into(),
            value: Value::String("secret".into()),
        };
        let mut body = Map::new();
        strategy.apply_to_body(&mut body);
        assert_eq!(body.get("api_key"), Some(&Value::String("secret".into())));
    }

    #[test]
    fn non_body_strategies_leave_body_untouched() {
        let strategy = AuthStrategy::Bearer { token: "abc".into() };
        let mut body = Map::new();
        strategy.apply_to_body(&mut body);
        assert!(body.is_empty());
    }
}
