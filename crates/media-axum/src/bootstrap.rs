//! Axum server composition (§9 "no global singletons").
//!
//! `AxumContext` is assembled once by the binary's composition root
//! (`media-cli`) from already-constructed services — the scheduler, the
//! service registry, configured proxy providers — and handed down by
//! `Arc`. This module never constructs those services itself; it only
//! owns the router/listener wiring.

use std::sync::Arc;

use anyhow::Result;
use media_core::ports::{JobQueuePort, ServiceRegistry};
use media_core::proxy::ProxyProvider;
use media_core::settings::AppConfig;

/// CORS configuration for the web server (§6 "CORS-permissive").
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins, methods, and headers. The orchestrator has no
    /// browser-facing session cookies to protect, so this is also the
    /// production default.
    #[default]
    AllowAll,
    AllowOrigins(Vec<String>),
}

/// Listener configuration for `start_server`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub cors: CorsConfig,
}

impl ServerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            bind_addr: config
                .bind_addr
                .clone()
                .unwrap_or_else(|| format!("0.0.0.0:{}", media_core::settings::DEFAULT_BIND_PORT)),
            cors: CorsConfig::default(),
        }
    }
}

/// Everything an HTTP handler needs, gathered behind one `Arc` (§4.7).
pub struct AxumContext {
    pub queue: Arc<dyn JobQueuePort>,
    pub services: ServiceRegistry,
    pub proxy_providers: Vec<Arc<dyn ProxyProvider>>,
    pub config: AppConfig,
}

impl AxumContext {
    #[must_use]
    pub fn new(
        queue: Arc<dyn JobQueuePort>,
        services: ServiceRegistry,
        proxy_providers: Vec<Arc<dyn ProxyProvider>>,
        config: AppConfig,
    ) -> Self {
        Self {
            queue,
            services,
            proxy_providers,
            config,
        }
    }
}

/// Start the web server, serving API routes only (no static/SPA assets —
/// the orchestrator has no bundled UI).
pub async fn start_server(ctx: AxumContext, config: &ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let state = Arc::new(ctx);
    let app = crate::routes::create_router(state, &config.cors);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "media orchestrator API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
