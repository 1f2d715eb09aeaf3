use clap::{CommandFactory, Parser};
use media_cli::{Cli, CliError, Commands};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "media-orchestrator exiting");
        eprintln!("error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve { bind_addr }) => {
            let config = media_cli::bootstrap::load_app_config(cli.config_path.as_deref())
                .map_err(|e| anyhow::anyhow!(CliError::Config(e.to_string())))?;
            media_cli::handlers::serve::execute(config, bind_addr).await?;
        }
        Some(Commands::RunWorkerJob { payload, result, progress }) => {
            let code = media_cli::handlers::worker::execute(payload, result, progress).await;
            std::process::exit(code);
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

/// Map the top-level error to a sysexits.h-style exit code when the
/// failure originated as a `CliError`; anything else is a general failure.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}
