//! Job and outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::processor::{LoudnessMeasurement, Operation, ProcessorError};

/// One uploaded file staged for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Position of the file in its batch.
    pub index: usize,
    /// Filename as uploaded, without directory components.
    pub filename: String,
    /// Where the upload was written inside the workspace.
    pub input_path: PathBuf,
}

impl Job {
    /// Filename of the normalized output (`<stem>_normalized.mp3`).
    pub fn normalized_filename(&self) -> String {
        let stem = Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone());
        format!("{}_normalized.mp3", stem)
    }
}

/// Final status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Error,
    Timeout,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn status_of(err: &ProcessorError) -> JobStatus {
    if err.is_timeout() {
        JobStatus::Timeout
    } else {
        JobStatus::Error
    }
}

fn message_of(operation: Operation, err: &ProcessorError) -> String {
    if err.is_timeout() {
        operation.timeout_message().to_string()
    } else {
        err.to_string()
    }
}

/// Common view over per-job results, whatever the operation.
pub trait JobOutcome: Send + 'static {
    /// The job's filename.
    fn filename(&self) -> &str;

    /// Final status.
    fn status(&self) -> JobStatus;

    /// Failure detail, if any.
    fn message(&self) -> Option<&str>;

    /// Outcome for a job whose worker died before producing a result.
    fn crashed(job: &Job, reason: String) -> Self
    where
        Self: Sized;
}

/// Result of measuring one file, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub filename: String,
    pub lufs: Option<String>,
    pub tp: Option<String>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisOutcome {
    /// Folds a processor result into an outcome.
    pub fn from_result(job: &Job, result: Result<LoudnessMeasurement, ProcessorError>) -> Self {
        match result {
            Ok(measurement) => Self {
                filename: job.filename.clone(),
                lufs: measurement.integrated_lufs,
                tp: measurement.true_peak_dbtp,
                status: JobStatus::Success,
                error: None,
            },
            Err(err) => Self {
                filename: job.filename.clone(),
                lufs: None,
                tp: None,
                status: status_of(&err),
                error: Some(message_of(Operation::Analyze, &err)),
            },
        }
    }
}

impl JobOutcome for AnalysisOutcome {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn status(&self) -> JobStatus {
        self.status
    }

    fn message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn crashed(job: &Job, reason: String) -> Self {
        Self {
            filename: job.filename.clone(),
            lufs: None,
            tp: None,
            status: JobStatus::Error,
            error: Some(reason),
        }
    }
}

/// Result of normalizing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationOutcome {
    pub filename: String,
    pub status: JobStatus,
    /// Present only on success.
    pub output_path: Option<PathBuf>,
    /// Present only on failure.
    pub message: Option<String>,
}

impl NormalizationOutcome {
    /// Folds a processor result into an outcome.
    pub fn from_result(job: &Job, output_path: PathBuf, result: Result<(), ProcessorError>) -> Self {
        match result {
            Ok(()) => Self {
                filename: job.filename.clone(),
                status: JobStatus::Success,
                output_path: Some(output_path),
                message: None,
            },
            Err(err) => Self {
                filename: job.filename.clone(),
                status: status_of(&err),
                output_path: None,
                message: Some(message_of(Operation::Normalize, &err)),
            },
        }
    }
}

impl JobOutcome for NormalizationOutcome {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn status(&self) -> JobStatus {
        self.status
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn crashed(job: &Job, reason: String) -> Self {
        Self {
            filename: job.filename.clone(),
            status: JobStatus::Error,
            output_path: None,
            message: Some(reason),
        }
    }
}
