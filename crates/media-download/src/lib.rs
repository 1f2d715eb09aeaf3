//! Worker subprocess runtime and job queue/scheduler (C5, C6, C8).

pub mod protocol;
pub mod scheduler;
pub mod shutdown;
pub mod worker;

pub use protocol::{ProgressStatus, ProtocolError, WorkerPayload, WorkerProgress, WorkerResult};
pub use scheduler::Scheduler;
pub use shutdown::shutdown_child;
pub use worker::{WorkerConfig, WorkerError, run_worker, sweep_stale_temp_files};

#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;
