#![deny(unused_crate_dependencies)]

pub mod cache;
pub mod error;
pub mod job;
pub mod params;
pub mod paths;
pub mod ports;
pub mod proxy;
pub mod queue;
pub mod settings;

pub use cache::{Cache, CacheEntry, CacheError, ExpirationInput, parse_expiration};
pub use error::{ApiError, DebugInfo, ErrorCode, ErrorStatus, categorize};
pub use job::{Job, JobError, JobStatus};
pub use params::{
    AudioCodec, DownloadParameters, DynamicRange, ParameterError, SubtitleFormat, VideoCodec,
    validate_parameters,
};
pub use paths::{
    PathError, cache_root, config_file_path, config_root, ensure_directory, logs_root,
    read_config_file, temp_root, verify_writable, write_config_file,
};
pub use ports::{
    Chapter, JobQueuePort, ServiceAdapter, ServiceAdapterError, ServiceRegistry, Title, Track,
};
pub use proxy::{ProxyError, ProxyProvider, ProxySpec, parse_proxy_spec, resolve_proxy};
pub use queue::{JobSummary, QueueSnapshot, format_duration};
pub use settings::{AppConfig, AppConfigUpdate, ConfigError, validate_config};

// Silence unused dev-dependency warnings until every crate has mock-based tests
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;
