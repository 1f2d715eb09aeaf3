//! The `Job` domain type (§3) and its status lifecycle.
//!
//! A `Job` is created in `Queued` state by the HTTP API and lives in the
//! scheduler's in-memory map for its whole life; it is never persisted to
//! disk. The cancellation flag lives alongside it but is intentionally not
//! part of the serializable view returned to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Status of a `Job`. Transitions form a DAG (§3 invariants):
/// `Queued -> {Downloading, Cancelled}`, `Downloading -> {Completed, Failed,
/// Cancelled}`. Terminal states never transition further.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Downloading,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether `self -> next` is a legal transition per the status DAG.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Downloading | Self::Cancelled)
                | (
                    Self::Downloading,
                    Self::Completed | Self::Failed | Self::Cancelled
                )
        )
    }
}

/// Error detail captured on a failed job, mirroring the worker result
/// protocol's error fields (§4.5).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_stderr: Option<String>,
}

impl From<&ApiError> for JobError {
    fn from(err: &ApiError) -> Self {
        Self {
            message: err.message.clone(),
            details: err.details.clone(),
            code: Some(format!("{:?}", err.error_code)),
            traceback: err.debug_info.as_ref().and_then(|d| d.traceback.clone()),
            worker_stderr: None,
        }
    }
}

/// A single download request's lifecycle record (§3 Job).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub created_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<DateTime<Utc>>,

    pub service: String,
    pub title_id: String,
    pub parameters: serde_json::Value,

    pub progress: f64,
    pub output_files: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
}

impl Job {
    /// Create a freshly-queued job. `id` is a fresh random UUID.
    #[must_use]
    pub fn new(service: impl Into<String>, title_id: impl Into<String>, parameters: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            created_time: Utc::now(),
            started_time: None,
            completed_time: None,
            service: service.into(),
            title_id: title_id.into(),
            parameters,
            progress: 0.0,
            output_files: Vec::new(),
            error: None,
        }
    }

    /// Attempt a status transition, enforcing the DAG invariant and the
    /// companion timestamp invariants (§3): `started_time` is set iff the
    /// job ever entered `Downloading`; `completed_time` is set iff the job
    /// reaches a terminal state.
    ///
    /// Returns `false` (no-op) if the transition is illegal — callers should
    /// treat that as a logic error worth logging, not propagate it as a
    /// per-request failure.
    pub fn transition(&mut self, next: JobStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }

        if next == JobStatus::Downloading {
            self.started_time = Some(Utc::now());
        }
        if next.is_terminal() {
            self.completed_time = Some(Utc::now());
        }
        self.status = next;
        true
    }

    /// Update progress, clamping to `[0.0, 100.0]` and enforcing the
    /// monotone-non-decreasing invariant while `Downloading` (§3, §8 property 2).
    pub fn update_progress(&mut self, progress: f64) {
        if self.status != JobStatus::Downloading {
            return;
        }
        let clamped = progress.clamp(0.0, 100.0);
        if clamped > self.progress {
            self.progress = clamped;
        }
    }

    pub fn complete(&mut self, output_files: Vec<String>) {
        if self.transition(JobStatus::Completed) {
            self.output_files = output_files;
            self.progress = 100.0;
        }
    }

    pub fn fail(&mut self, error: JobError) {
        if self.transition(JobStatus::Failed) {
            self.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_to_downloading_sets_started_time_only() {
        let mut job = Job::new("EX", "TT001", serde_json::json!({}));
        assert!(job.transition(JobStatus::Downloading));
        assert!(job.started_time.is_some());
        assert!(job.completed_time.is_none());
    }

    #[test]
    fn terminal_states_set_completed_time() {
        let mut job = Job::new("EX", "TT001", serde_json::json!({}));
        job.transition(JobStatus::Downloading);
        job.complete(vec!["out.mkv".into()]);
        assert!(job.completed_time.is_some());
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100.0);
    }

    #[test]
    fn terminal_states_never_transition_again() {
        let mut job = Job::new("EX", "TT001", serde_json::json!({}));
        job.transition(JobStatus::Downloading);
        job.complete(vec![]);
        assert!(!job.transition(JobStatus::Failed));
        assert!(!job.transition(JobStatus::Cancelled));
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn queued_can_be_cancelled_directly() {
        let mut job = Job::new("EX", "TT001", serde_json::json!({}));
        assert!(job.transition(JobStatus::Cancelled));
        assert!(job.started_time.is_none());
        assert!(job.completed_time.is_some());
    }

    #[test]
    fn progress_is_monotone_while_downloading() {
        let mut job = Job::new("EX", "TT001", serde_json::json!({}));
        job.transition(JobStatus::Downloading);
        job.update_progress(40.0);
        job.update_progress(10.0);
        assert_eq!(job.progress, 40.0);
        job.update_progress(60.0);
        assert_eq!(job.progress, 60.0);
    }

    #[test]
    fn progress_ignored_outside_downloading() {
        let mut job = Job::new("EX", "TT001", serde_json::json!({}));
        job.update_progress(50.0);
        assert_eq!(job.progress, 0.0);
    }
}
