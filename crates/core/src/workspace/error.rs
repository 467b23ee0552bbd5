//! Error types for the workspace module.

use thiserror::Error;

/// Errors that can occur while staging uploads.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Upload rejected before anything was written.
    #[error("File {filename} is not an MP3")]
    InvalidUpload { filename: String },

    /// Filesystem error.
    #[error("Workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}
