//! Proxy string resolution (§6 "Proxy resolution").
//!
//! Resolving a `--proxy` value to a concrete URI is intentionally
//! synchronous-signature-shaped: providers are consulted in order and the
//! first one to produce a URI wins. Each provider implementation is free to
//! do I/O under the hood (most call out to a proxy vendor's API).

use async_trait::async_trait;
use thiserror::Error;

/// A configured proxy provider, keyed by name (e.g. `"nordvpn"`).
#[async_trait]
pub trait ProxyProvider: Send + Sync {
    /// Short name this provider is addressed by in a `provider:country` spec.
    fn name(&self) -> &str;

    /// Resolve a proxy URI for the given 2-letter (or similar) country code.
    /// Returns `Ok(None)` if this provider has nothing for that country
    /// (caller tries the next configured provider).
    async fn get_proxy(&self, country: &str) -> Result<Option<String>, ProxyError>;
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy provider {provider} not configured")]
    ProviderNotConfigured { provider: String },
    #[error("proxy provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },
}

/// The three forms `--proxy` may take per §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxySpec {
    /// Already a `http://` or `https://` URI — used as-is.
    Explicit(String),
    /// `provider:country`, e.g. `nordvpn:us`.
    Qualified { provider: String, country: String },
    /// A bare country code, optionally with a trailing number (`us`, `us1`).
    BareCountry(String),
}

/// Parse the raw `proxy` parameter into one of the three recognized forms.
#[must_use]
pub fn parse_proxy_spec(raw: &str) -> ProxySpec {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return ProxySpec::Explicit(raw.to_string());
    }
    if let Some((provider, country)) = raw.split_once(':') {
        return ProxySpec::Qualified {
            provider: provider.to_string(),
            country: country.to_string(),
        };
    }
    ProxySpec::BareCountry(raw.to_string())
}

/// Resolve a proxy spec to a concrete URI using the given configured
/// providers, tried in order for bare country codes.
pub async fn resolve_proxy(spec: &ProxySpec, providers: &[std::sync::Arc<dyn ProxyProvider>]) -> Result<Option<String>, ProxyError> {
    match spec {
        ProxySpec::Explicit(uri) => Ok(Some(uri.clone())),
        ProxySpec::Qualified { provider, country } => {
            let found = providers.iter().find(|p| p.name() == provider);
            match found {
                Some(p) => p.get_proxy(country).await,
                None => Err(ProxyError::ProviderNotConfigured {
                    provider: provider.clone(),
                }),
            }
        }
        ProxySpec::BareCountry(country) => {
            for provider in providers {
                if let Some(uri) = provider.get_proxy(country).await? {
                    return Ok(Some(uri));
                }
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct StubProvider {
        name: String,
        answer: Option<String>,
    }

    #[async_trait]
    impl ProxyProvider for StubProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn get_proxy(&self, _country: &str) -> Result<Option<String>, ProxyError> {
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn parses_explicit_uri() {
        assert_eq!(
            parse_proxy_spec("http://10.0.0.1:8080"),
            ProxySpec::Explicit("http://10.0.0.1:8080".to_string())
        );
    }

    #[test]
    fn parses_qualified_spec() {
        assert_eq!(
            parse_proxy_spec("nordvpn:us"),
            ProxySpec::Qualified {
                provider: "nordvpn".to_string(),
                country: "us".to_string()
            }
        );
    }

    #[test]
    fn parses_bare_country() {
        assert_eq!(parse_proxy_spec("us1"), ProxySpec::BareCountry("us1".to_string()));
    }

    #[tokio::test]
    async fn bare_country_tries_providers_in_order() {
        let providers: Vec<Arc<dyn ProxyProvider>> = vec![
            Arc::new(StubProvider {
                name: "a".into(),
                answer: None,
            }),
            Arc::new(StubProvider {
                name: "b".into(),
                answer: Some("http://b-proxy".into()),
            }),
        ];
        let resolved = resolve_proxy(&ProxySpec::BareCountry("us".into()), &providers)
            .await
            .unwrap();
        assert_eq!(resolved, Some("http://b-proxy".to_string()));
    }

    #[tokio::test]
    async fn qualified_spec_fails_when_provider_unconfigured() {
        let providers: Vec<Arc<dyn ProxyProvider>> = vec![];
        let err = resolve_proxy(
            &ProxySpec::Qualified {
                provider: "nordvpn".into(),
                country: "us".into(),
            },
            &providers,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProxyError::ProviderNotConfigured { .. }));
    }
}
