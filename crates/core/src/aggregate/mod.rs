//! Turns per-job outcomes into a response artifact.
//!
//! Analysis results are returned as-is. Normalization results are split into
//! successes and failures; successes are packed into a single zip archive,
//! and a batch without any success is an error.

mod archive;

pub use archive::{archive_entry_names, build_archive, ArchiveSummary};

use std::path::PathBuf;
use thiserror::Error;

use crate::jobs::{JobOutcome, NormalizationOutcome};

/// Separator between entries of a failure summary.
pub const FAILURE_SEPARATOR: &str = "; ";

/// Errors that can occur while aggregating a batch.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// No job in the batch succeeded.
    #[error("All files failed to normalize: {summary}")]
    AllJobsFailed { summary: String },

    /// Writing the archive failed.
    #[error("Failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Filesystem error.
    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking archive task died.
    #[error("Archive task failed: {0}")]
    Task(String),
}

/// Outcomes of a normalization batch split by status.
#[derive(Debug, Default)]
pub struct Partitioned {
    pub successes: Vec<NormalizationOutcome>,
    pub failures: Vec<NormalizationOutcome>,
}

impl Partitioned {
    /// Output files of all successful jobs, in batch order.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.successes
            .iter()
            .filter_map(|o| o.output_path.clone())
            .collect()
    }

    /// Human-readable summary of the failures.
    pub fn failure_summary(&self) -> String {
        failure_summary(&self.failures)
    }

    /// Fails with [`AggregateError::AllJobsFailed`] when nothing succeeded.
    pub fn require_success(self) -> Result<Self, AggregateError> {
        if self.successes.is_empty() {
            return Err(AggregateError::AllJobsFailed {
                summary: self.failure_summary(),
            });
        }
        Ok(self)
    }
}

/// Splits outcomes into successes and everything else, keeping order.
///
/// A success without an output path is treated as a failure.
pub fn partition(outcomes: Vec<NormalizationOutcome>) -> Partitioned {
    let (successes, failures) = outcomes
        .into_iter()
        .partition(|o| o.status().is_success() && o.output_path.is_some());
    Partitioned {
        successes,
        failures,
    }
}

/// Joins `"<filename>: <message>"` for each outcome.
pub fn failure_summary<T: JobOutcome>(failures: &[T]) -> String {
    failures
        .iter()
        .map(|o| format!("{}: {}", o.filename(), o.message().unwrap_or("unknown error")))
        .collect::<Vec<_>>()
        .join(FAILURE_SEPARATOR)
}
