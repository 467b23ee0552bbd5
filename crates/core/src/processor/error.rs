//! Error types for the processor module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::Operation;

/// Errors that can occur while running the external tool.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// The tool ran but reported failure.
    #[error("{stderr}")]
    Failed {
        operation: Operation,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The tool did not finish in time and was killed.
    #[error("{operation} timed out after {timeout_secs} seconds")]
    Timeout {
        operation: Operation,
        timeout_secs: u64,
    },

    /// I/O error while spawning or talking to the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessorError {
    /// Creates a failure error from a finished process.
    pub fn failed(operation: Operation, exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::Failed {
            operation,
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Whether this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_displays_stderr_verbatim() {
        let err = ProcessorError::failed(
            Operation::Normalize,
            Some(1),
            "song.mp3: Invalid data found when processing input\n",
        );
        assert_eq!(
            err.to_string(),
            "song.mp3: Invalid data found when processing input\n"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_display() {
        let err = ProcessorError::Timeout {
            operation: Operation::Analyze,
            timeout_secs: 60,
        };
        assert_eq!(err.to_string(), "Analysis timed out after 60 seconds");
        assert!(err.is_timeout());
    }
}
