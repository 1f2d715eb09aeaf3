//! The job queue/scheduler port (C6).
//!
//! This port is the public interface the HTTP layer (C7) programs against;
//! `media-download` provides the concrete implementation backed by a worker
//! pool of subprocesses (C5). No subprocess, `CancellationToken`, or
//! worker-protocol types leak through this boundary.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::params::DownloadParameters;
use crate::queue::QueueSnapshot;

/// Port for managing the download job queue.
///
/// Implementations own all scheduling concerns: concurrency limits,
/// cancellation, progress aggregation, and retention sweeping.
#[async_trait]
pub trait JobQueuePort: Send + Sync {
    /// Validate and enqueue a new download. Returns the new job's id.
    async fn enqueue(&self, params: DownloadParameters) -> Result<String, ApiError>;

    /// Snapshot of every job currently tracked (queued, active, or recently
    /// terminal and not yet swept).
    async fn snapshot(&self) -> QueueSnapshot;

    /// Look up a single job by id.
    async fn get(&self, id: &str) -> Option<crate::job::Job>;

    /// Cancel a job. Idempotent: cancelling an already-terminal job is a
    /// no-op, not an error (§8 "cancellation idempotence").
    async fn cancel(&self, id: &str) -> Result<(), ApiError>;

    /// Current number of jobs actively downloading.
    async fn active_count(&self) -> u32;

    /// Current number of queued (not yet started) jobs.
    async fn pending_count(&self) -> u32;
}
