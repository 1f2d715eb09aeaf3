//! The worker subprocess wire protocol (§4.5): three JSON files exchanged
//! between the scheduler and a spawned worker process.
//!
//! ```text
//! {job_id, service, title_id, parameters}        -- payload, parent -> child
//! {progress: float, status: string}               -- progress, child -> parent (repeated)
//! {status: "success"|"error", output_files?, ...}  -- result, child -> parent (once, at exit)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload written by the parent before spawning the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPayload {
    pub job_id: String,
    pub service: String,
    pub title_id: String,
    pub parameters: serde_json::Value,
}

/// Progress file contents, overwritten repeatedly by the child (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkerProgress {
    pub progress: f64,
    #[serde(default)]
    pub status: ProgressStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    Running,
    Muxing,
    Finalizing,
}

/// Result file contents, written once by the child at exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerResult {
    Success {
        #[serde(default)]
        output_files: Vec<String>,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_details: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        traceback: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to parse worker result: {0}")]
    InvalidResult(#[from] serde_json::Error),
}

/// Parse a result file's contents. Callers treat a parse failure as a
/// worker-runtime error distinct from a reported `WorkerResult::Error`.
pub fn parse_result(raw: &str) -> Result<WorkerResult, ProtocolError> {
    serde_json::from_str(raw).map_err(ProtocolError::InvalidResult)
}

/// Parse a progress file's contents. Per §4.8, malformed JSON here is a
/// silently-skipped non-error, never propagated — callers should match on
/// `Option` rather than surfacing `serde_json::Error`.
#[must_use]
pub fn try_parse_progress(raw: &str) -> Option<WorkerProgress> {
    serde_json::from_str(raw).ok()
}
