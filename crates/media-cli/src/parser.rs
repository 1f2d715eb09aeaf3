//! Top-level argument parsing.
//!
//! The interactive command surface a user would actually type is out of
//! scope here — this binary exposes only the two entry points the rest of
//! the system needs: `serve` (start the HTTP API) and the hidden worker
//! subcommand the scheduler self-reexecs into per job.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// `media-orchestrator` command-line entry point.
#[derive(Parser)]
#[command(name = "media-orchestrator")]
#[command(about = "Modular media archival orchestrator")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file, overriding the platform default location.
    #[arg(long = "config", global = true)]
    pub config_path: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API and job scheduler.
    Serve {
        /// Override the configured bind address, e.g. `0.0.0.0:7979`.
        #[arg(long)]
        bind_addr: Option<String>,
    },

    /// Internal worker entry point; the scheduler self-reexecs into this.
    /// Not intended to be invoked directly by a user.
    #[command(name = "run-worker-job", hide = true)]
    RunWorkerJob {
        payload: PathBuf,
        result: PathBuf,
        progress: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_accepts_bind_addr_override() {
        let cli = Cli::parse_from(["media-orchestrator", "serve", "--bind-addr", "127.0.0.1:9000"]);
        match cli.command {
            Some(Commands::Serve { bind_addr }) => assert_eq!(bind_addr.as_deref(), Some("127.0.0.1:9000")),
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn worker_job_parses_three_paths() {
        let cli = Cli::parse_from([
            "media-orchestrator",
            "run-worker-job",
            "/tmp/p.json",
            "/tmp/r.json",
            "/tmp/prog.json",
        ]);
        assert!(matches!(cli.command, Some(Commands::RunWorkerJob { .. })));
    }
}
