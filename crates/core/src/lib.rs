pub mod aggregate;
pub mod config;
pub mod jobs;
pub mod metrics;
pub mod processor;
pub mod service;
pub mod testing;
pub mod workspace;

pub use aggregate::{AggregateError, ArchiveSummary};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, LogFormat,
};
pub use jobs::{AnalysisOutcome, JobScheduler, JobStatus, NormalizationOutcome};
pub use processor::{
    FfmpegProcessor, LoudnessMeasurement, LoudnessProcessor, LoudnessTarget, ProcessorConfig,
    ProcessorError,
};
pub use service::{LoudnessService, NormalizedArchive, ServiceError, Upload};
pub use workspace::{TeardownGuard, Workspace, WorkspaceError, WorkspaceManager};
