//! The worker subprocess driver (C5, §4.5).
//!
//! Spawns one child process per job, writes its JSON payload to a temp
//! file, polls the child's progress file every 500ms, and parses its
//! result file at exit. Cancellation always goes through the parent
//! terminating the process group — the child has no cooperative cancel
//! point.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::protocol::{ProgressStatus, WorkerPayload, WorkerResult, parse_result, try_parse_progress};
use crate::shutdown::shutdown_child;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to prepare worker temp files: {0}")]
    TempFileSetup(String),

    #[error("failed to spawn worker process: {0}")]
    SpawnFailed(String),

    #[error("worker was cancelled")]
    Cancelled,

    #[error("worker exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },

    #[error("worker result file was missing or unparseable: {0}")]
    MissingResult(String),

    #[error("worker reported an error: {message}")]
    Reported {
        message: String,
        error_details: Option<String>,
        error_code: Option<String>,
        traceback: Option<String>,
    },
}

/// Configuration shared by all worker invocations, built once at startup.
///
/// The worker is a self-reexec of the current binary: the scheduler spawns
/// `<runtime> <worker_subcommand> <payload> <result> <progress>`, where
/// `runtime` is ordinarily `std::env::current_exe()` and `worker_subcommand`
/// is the hidden CLI verb `media-cli` dispatches to its worker entry point
/// (the one that links `media-drm` and the service adapters).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub runtime: PathBuf,
    pub worker_subcommand: String,
    /// Root directory for the three per-job temp files.
    pub temp_root: PathBuf,
}

/// The three temp files allocated for one job's worker invocation.
#[derive(Debug, Clone)]
pub struct JobTempFiles {
    pub payload: PathBuf,
    pub result: PathBuf,
    pub progress: PathBuf,
}

impl JobTempFiles {
    fn for_job(temp_root: &Path, job_id: Uuid) -> Self {
        Self {
            payload: temp_root.join(format!("mediaorc_job_{job_id}_payload.json")),
            result: temp_root.join(format!("mediaorc_job_{job_id}_result.json")),
            progress: temp_root.join(format!("mediaorc_job_{job_id}_progress.json")),
        }
    }

    fn cleanup(&self) {
        let _ = std::fs::remove_file(&self.payload);
        let _ = std::fs::remove_file(&self.result);
        let _ = std::fs::remove_file(&self.progress);
    }
}

/// Run one job end-to-end as a worker subprocess.
///
/// `on_progress` is called whenever the progress file reports a changed
/// value; it should update the in-memory `Job` (the scheduler owns that).
pub async fn run_worker(
    config: &WorkerConfig,
    job_id: Uuid,
    service: &str,
    title_id: &str,
    parameters: serde_json::Value,
    cancel: CancellationToken,
    mut on_progress: impl FnMut(f64, ProgressStatus),
) -> Result<Vec<String>, WorkerError> {
    std::fs::create_dir_all(&config.temp_root)
        .map_err(|e| WorkerError::TempFileSetup(e.to_string()))?;
    let temp_files = JobTempFiles::for_job(&config.temp_root, job_id);

    let payload = WorkerPayload {
        job_id: job_id.to_string(),
        service: service.to_string(),
        title_id: title_id.to_string(),
        parameters,
    };
    let payload_json =
        serde_json::to_string(&payload).map_err(|e| WorkerError::TempFileSetup(e.to_string()))?;
    std::fs::write(&temp_files.payload, payload_json)
        .map_err(|e| WorkerError::TempFileSetup(e.to_string()))?;

    let result = drive_subprocess(config, &temp_files, &cancel, &mut on_progress).await;
    temp_files.cleanup();
    result
}

async fn drive_subprocess(
    config: &WorkerConfig,
    temp_files: &JobTempFiles,
    cancel: &CancellationToken,
    on_progress: &mut impl FnMut(f64, ProgressStatus),
) -> Result<Vec<String>, WorkerError> {
    let mut child = Command::new(&config.runtime)
        .arg(&config.worker_subcommand)
        .arg(&temp_files.payload)
        .arg(&temp_files.result)
        .arg(&temp_files.progress)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

    let mut stderr_buf = Vec::new();
    let mut stderr_pipe = child.stderr.take();

    let mut last_progress: Option<f64> = None;
    let mut ticker = interval(POLL_INTERVAL);

    let exit_status = loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = shutdown_child(child).await;
                return Err(WorkerError::Cancelled);
            }
            _ = ticker.tick() => {
                if let Some(progress) = read_progress(&temp_files.progress) {
                    if last_progress != Some(progress.progress) {
                        last_progress = Some(progress.progress);
                        on_progress(progress.progress, progress.status);
                    }
                }
                if let Ok(Some(status)) = child.try_wait() {
                    break status;
                }
            }
        }
    };

    if let Some(mut pipe) = stderr_pipe.take() {
        let _ = pipe.read_to_end(&mut stderr_buf).await;
    }
    let stderr_text = String::from_utf8_lossy(&stderr_buf).trim().to_string();

    let result_raw = std::fs::read_to_string(&temp_files.result)
        .map_err(|e| WorkerError::MissingResult(e.to_string()))?;
    let result =
        parse_result(&result_raw).map_err(|e| WorkerError::MissingResult(e.to_string()))?;

    if !exit_status.success() {
        return Err(WorkerError::NonZeroExit {
            status: exit_status.code().unwrap_or(-1),
            stderr: stderr_text,
        });
    }

    match result {
        WorkerResult::Success { output_files } => Ok(output_files),
        WorkerResult::Error {
            message,
            error_details,
            error_code,
            traceback,
        } => Err(WorkerError::Reported {
            message,
            error_details,
            error_code,
            traceback,
        }),
    }
}

fn read_progress(path: &Path) -> Option<crate::protocol::WorkerProgress> {
    let raw = std::fs::read_to_string(path).ok()?;
    try_parse_progress(&raw)
}

/// Startup crash-recovery sweep (§4.5 "Startup sweep"): remove any leftover
/// worker temp files from a prior crash before the scheduler accepts jobs.
/// Best-effort; errors are swallowed since jobs are in-memory only and a
/// crash has already lost their state.
pub fn sweep_stale_temp_files(temp_root: &Path) {
    let Ok(entries) = std::fs::read_dir(temp_root) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("mediaorc_job_")
            && (name.ends_with("_payload.json")
                || name.ends_with("_result.json")
                || name.ends_with("_progress.json"))
        {
            let _ = std::fs::remove_file(entry.path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_temp_files_are_distinct_and_namespaced() {
        let id = Uuid::new_v4();
        let files = JobTempFiles::for_job(Path::new("/tmp"), id);
        assert!(files.payload.to_string_lossy().contains(&id.to_string()));
        assert_ne!(files.payload, files.result);
        assert_ne!(files.result, files.progress);
    }

    #[test]
    fn sweep_removes_only_worker_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("mediaorc_job_abc_result.json");
        let unrelated = dir.path().join("unrelated.json");
        std::fs::write(&stale, "{}").unwrap();
        std::fs::write(&unrelated, "{}").unwrap();

        sweep_stale_temp_files(dir.path());

        assert!(!stale.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn read_progress_returns_none_for_missing_file() {
        assert!(read_progress(Path::new("/nonexistent/path/progress.json")).is_none());
    }
}
