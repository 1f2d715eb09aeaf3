//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No subprocess/HTTP-client types in any signature
//! - No reflection-based adapter dispatch; `ServiceRegistry` is a plain map
//! - Traits are minimal and intent-based, not implementation-leaking

pub mod job_queue;
pub mod service_adapter;

pub use job_queue::JobQueuePort;
pub use service_adapter::{
    Chapter, ServiceAdapter, ServiceAdapterError, ServiceRegistry, Title, Track,
};
