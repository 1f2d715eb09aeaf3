//! Command handlers. Two entry points: `serve` starts the long-running
//! API process; `worker` is the hidden self-reexec job runner (C5).

pub mod serve;
pub mod worker;
