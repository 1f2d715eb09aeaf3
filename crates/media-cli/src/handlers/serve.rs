//! The `serve` command: start the job scheduler and HTTP API (C6/C7).

use media_axum::{AxumContext, ServerConfig, start_server};
use media_core::ports::JobQueuePort;
use media_core::settings::AppConfig;
use media_download::{Scheduler, WorkerConfig};

use crate::bootstrap;

pub async fn execute(config: AppConfig, bind_addr_override: Option<String>) -> anyhow::Result<()> {
    let worker_config = WorkerConfig {
        runtime: std::env::current_exe()?,
        worker_subcommand: "run-worker-job".to_string(),
        temp_root: config
            .temp_root
            .clone()
            .map_or_else(media_core::paths::temp_root, std::path::PathBuf::from),
    };

    let scheduler = Scheduler::start(
        worker_config,
        config.effective_max_concurrent_downloads(),
        config.effective_job_retention_hours(),
    );

    let registry = bootstrap::build_service_registry();
    let proxy_providers = bootstrap::build_proxy_providers();

    let mut server_config = ServerConfig::from_app_config(&config);
    if let Some(bind_addr) = bind_addr_override {
        server_config.bind_addr = bind_addr;
    }

    let queue: std::sync::Arc<dyn JobQueuePort> = scheduler.clone();
    let ctx = AxumContext::new(queue, registry, proxy_providers, config);

    let result = start_server(ctx, &server_config).await;
    scheduler.shutdown();
    result
}
