//! Jobs module: the per-file unit of work and the batch scheduler.
//!
//! A request is turned into a batch of [`Job`]s. The [`JobScheduler`] runs
//! them with a bounded number of concurrent workers and returns one
//! [`JobOutcome`] per job, in submission order.

mod scheduler;
mod types;
mod worker;

pub use scheduler::{BatchSummary, JobScheduler, SchedulerError};
pub use types::{AnalysisOutcome, Job, JobOutcome, JobStatus, NormalizationOutcome};
pub use worker::{analyze_job, normalize_job};
