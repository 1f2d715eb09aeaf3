//! Queue DTOs for the `GET /download/jobs` listing endpoint (§6).
//!
//! "UI safe" view types: Clone + Debug + Serialize with no infrastructure
//! dependencies, built from a `Job` by the scheduler on demand rather than
//! kept incrementally in sync.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::job::{Job, JobStatus};

/// Snapshot of the whole job set returned by `GET /download/jobs`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub jobs: Vec<JobSummary>,
    pub active_count: u32,
    pub pending_count: u32,
}

impl QueueSnapshot {
    #[must_use]
    pub fn from_jobs(jobs: impl IntoIterator<Item = JobSummary>) -> Self {
        let jobs: Vec<JobSummary> = jobs.into_iter().collect();
        let active_count = jobs.iter().filter(|j| j.status == JobStatus::Downloading).count() as u32;
        let pending_count = jobs.iter().filter(|j| j.status == JobStatus::Queued).count() as u32;
        Self {
            jobs,
            active_count,
            pending_count,
        }
    }
}

/// A single row in a queue listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub service: String,
    pub title_id: String,
    pub status: JobStatus,
    pub progress_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            service: job.service.clone(),
            title_id: job.title_id.clone(),
            status: job.status,
            progress_percent: job.progress,
            error: job.error.as_ref().map(|e| e.message.clone()),
        }
    }
}

/// Human-readable duration, e.g. `"1h 1m"`, `"1m 30s"`, `"30s"`.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    let duration = Duration::from_secs(secs);
    let hours = duration.as_secs() / 3600;
    let minutes = (duration.as_secs() % 3600) / 60;
    let seconds = duration.as_secs() % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
