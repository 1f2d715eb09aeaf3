//! The job queue and scheduler (C6, §4.6).
//!
//! A single bounded-concurrency scheduler: an in-memory FIFO of pending job
//! ids, N long-running worker tasks each looping on a 1s-timeout recv, and
//! an hourly sweeper that evicts terminal jobs past their retention window.
//! Cancellation of an active job is a single-shot `CancellationToken`
//! (§9 "cancellation as atomic flag/token, never a thread signal").

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use media_core::error::{ApiError, categorize};
use media_core::job::{Job, JobError, JobStatus};
use media_core::params::DownloadParameters;
use media_core::ports::JobQueuePort;
use media_core::queue::{JobSummary, QueueSnapshot};

use crate::protocol::ProgressStatus;
use crate::worker::{WorkerConfig, WorkerError, run_worker};

const WORKER_POLL_TIMEOUT: Duration = Duration::from_secs(1);
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

struct SchedulerState {
    jobs: HashMap<Uuid, Job>,
    pending: VecDeque<Uuid>,
    active_cancel: HashMap<Uuid, CancellationToken>,
}

impl SchedulerState {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            pending: VecDeque::new(),
            active_cancel: HashMap::new(),
        }
    }
}

/// Concrete `JobQueuePort` implementation backed by a worker-subprocess pool.
pub struct Scheduler {
    state: Mutex<SchedulerState>,
    notify: Notify,
    worker_config: WorkerConfig,
    job_retention_hours: u32,
    shutdown: CancellationToken,
}

impl Scheduler {
    /// Construct a scheduler and spawn its `max_concurrent_downloads` worker
    /// tasks plus the hourly sweeper, all owned by the returned `Arc`.
    ///
    /// Per §9 ("no module-level mutable global singletons"), the caller
    /// (the composition root) owns this `Arc` and passes it down explicitly
    /// rather than stashing it in a `static`.
    #[must_use]
    pub fn start(
        worker_config: WorkerConfig,
        max_concurrent_downloads: u32,
        job_retention_hours: u32,
    ) -> Arc<Self> {
        crate::worker::sweep_stale_temp_files(&worker_config.temp_root);

        let scheduler = Arc::new(Self {
            state: Mutex::new(SchedulerState::new()),
            notify: Notify::new(),
            worker_config,
            job_retention_hours,
            shutdown: CancellationToken::new(),
        });

        for _ in 0..max_concurrent_downloads.max(1) {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.worker_loop().await });
        }

        let sweeper = scheduler.clone();
        tokio::spawn(async move { sweeper.sweep_loop().await });

        scheduler
    }

    /// Signal every worker/sweeper task to stop and terminate any running
    /// child processes (their own `CancellationToken`s are triggered).
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.notify.notify_waiters();
    }

    async fn worker_loop(self: Arc<Self>) {
        loop {
            if self.shutdown.is_cancelled() {
                return;
            }

            let next = tokio::select! {
                () = self.shutdown.cancelled() => return,
                job_id = self.wait_for_next_pending() => job_id,
            };

            let Some(job_id) = next else { continue };
            self.run_one(job_id).await;
        }
    }

    /// Wait (with a 1s timeout, per §4.6's worker loop pseudocode) for a
    /// pending job id, or `None` on timeout so the caller can re-check
    /// shutdown.
    async fn wait_for_next_pending(&self) -> Option<Uuid> {
        tokio::select! {
            () = self.notify.notified() => {}
            () = tokio::time::sleep(WORKER_POLL_TIMEOUT) => {}
        }

        let mut state = self.state.lock().await;
        while let Some(job_id) = state.pending.pop_front() {
            match state.jobs.get(&job_id).map(|j| j.status) {
                Some(JobStatus::Cancelled) | None => continue,
                Some(_) => return Some(job_id),
            }
        }
        None
    }

    async fn run_one(self: &Arc<Self>, job_id: Uuid) {
        let (service, title_id, parameters) = {
            let mut state = self.state.lock().await;
            let Some(job) = state.jobs.get_mut(&job_id) else {
                return;
            };
            if !job.transition(JobStatus::Downloading) {
                return;
            }
            let result = (job.service.clone(), job.title_id.clone(), job.parameters.clone());
            let cancel = CancellationToken::new();
            state.active_cancel.insert(job_id, cancel);
            result
        };

        let cancel = {
            let state = self.state.lock().await;
            state.active_cancel.get(&job_id).cloned().unwrap_or_default()
        };

        let scheduler = self.clone();
        let on_progress = move |progress: f64, _status: ProgressStatus| {
            let scheduler = scheduler.clone();
            tokio::spawn(async move {
                let mut state = scheduler.state.lock().await;
                if let Some(job) = state.jobs.get_mut(&job_id) {
                    job.update_progress(progress);
                }
            });
        };

        info!(%job_id, %service, %title_id, "job started");

        let result = run_worker(
            &self.worker_config,
            job_id,
            &service,
            &title_id,
            parameters,
            cancel,
            on_progress,
        )
        .await;

        if let Err(ref err) = result {
            warn!(%job_id, error = %err, "job failed");
        }

        self.finalize(job_id, result).await;
    }

    async fn finalize(&self, job_id: Uuid, result: Result<Vec<String>, WorkerError>) {
        let mut state = self.state.lock().await;
        state.active_cancel.remove(&job_id);
        let Some(job) = state.jobs.get_mut(&job_id) else {
            return;
        };

        match result {
            Ok(output_files) => job.complete(output_files),
            Err(WorkerError::Cancelled) => {
                job.transition(JobStatus::Cancelled);
            }
            Err(err) => {
                let message = err.to_string();
                let code = categorize(&message, "WorkerError");
                job.fail(JobError::from(&ApiError::new(code, message)));
            }
        }
    }

    async fn sweep_loop(self: Arc<Self>) {
        let mut ticker = interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => return,
                _ = ticker.tick() => self.sweep_once().await,
            }
        }
    }

    async fn sweep_once(&self) {
        let cutoff = Utc::now() - chrono::Duration::hours(i64::from(self.job_retention_hours));
        let mut state = self.state.lock().await;
        state.jobs.retain(|_, job| {
            if !job.status.is_terminal() {
                return true;
            }
            let age_reference = job.completed_time.unwrap_or(job.created_time);
            age_reference >= cutoff
        });
    }
}

#[async_trait]
impl JobQueuePort for Scheduler {
    async fn enqueue(&self, params: DownloadParameters) -> Result<String, ApiError> {
        media_core::params::validate_parameters(&params)
            .map_err(|e| ApiError::invalid_parameters(e.to_string()))?;

        let job = Job::new(
            params.service.clone(),
            params.title_id.clone(),
            serde_json::to_value(&params).unwrap_or(serde_json::Value::Null),
        );
        let job_id = job.id;

        let mut state = self.state.lock().await;
        state.jobs.insert(job_id, job);
        state.pending.push_back(job_id);
        drop(state);

        self.notify.notify_one();
        Ok(job_id.to_string())
    }

    async fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock().await;
        QueueSnapshot::from_jobs(state.jobs.values().map(JobSummary::from))
    }

    async fn get(&self, id: &str) -> Option<Job> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return None;
        };
        let state = self.state.lock().await;
        state.jobs.get(&uuid).cloned()
    }

    async fn cancel(&self, id: &str) -> Result<(), ApiError> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Err(ApiError::job_not_found(id));
        };

        let mut state = self.state.lock().await;
        let Some(job) = state.jobs.get_mut(&uuid) else {
            return Err(ApiError::job_not_found(id));
        };

        if job.status.is_terminal() {
            return Ok(());
        }

        let was_downloading = job.status == JobStatus::Downloading;
        job.transition(JobStatus::Cancelled);
        if was_downloading {
            if let Some(cancel) = state.active_cancel.get(&uuid) {
                cancel.cancel();
            }
        }
        Ok(())
    }

    async fn active_count(&self) -> u32 {
        let state = self.state.lock().await;
        state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Downloading)
            .count() as u32
    }

    async fn pending_count(&self) -> u32 {
        let state = self.state.lock().await;
        state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Queued)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WorkerConfig {
        WorkerConfig {
            runtime: "/bin/true".into(),
            worker_subcommand: "run-worker-job".into(),
            temp_root: std::env::temp_dir().join("media-orchestrator-tests"),
        }
    }

    fn params() -> DownloadParameters {
        DownloadParameters {
            service: "EX".into(),
            title_id: "TT001".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn enqueue_rejects_invalid_parameters() {
        let scheduler = Scheduler::start(config(), 1, 24);
        let result = scheduler
            .enqueue(DownloadParameters {
                service: String::new(),
                ..params()
            })
            .await;
        assert!(result.is_err());
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn enqueue_then_snapshot_shows_queued_job() {
        let scheduler = Scheduler::start(config(), 0, 24);
        let id = scheduler.enqueue(params()).await.unwrap();
        let snapshot = scheduler.snapshot().await;
        assert_eq!(snapshot.jobs.len(), 1);
        assert_eq!(snapshot.jobs[0].id, id);
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn cancelling_unknown_job_is_an_error() {
        let scheduler = Scheduler::start(config(), 0, 24);
        let result = scheduler.cancel(&Uuid::new_v4().to_string()).await;
        assert!(result.is_err());
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn cancelling_queued_job_is_idempotent() {
        let scheduler = Scheduler::start(config(), 0, 24);
        let id = scheduler.enqueue(params()).await.unwrap();
        scheduler.cancel(&id).await.unwrap();
        scheduler.cancel(&id).await.unwrap();
        let job = scheduler.get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        scheduler.shutdown();
    }
}
