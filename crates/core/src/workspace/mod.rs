//! Per-request scratch directories.
//!
//! Every request gets its own [`Workspace`] under the configured temp root:
//!
//! ```text
//! <temp_root>/loudnorm_<session-uuid>_<random>/
//!     input/<index>/<filename>.mp3
//!     output/<index>/<stem>_normalized.mp3
//!     output/normalized_audio_<session-uuid>.zip
//! ```
//!
//! A workspace is removed when [`Workspace::teardown`] is called, when its
//! [`TeardownGuard`] is dropped, or when the workspace itself is dropped.

mod error;

pub use error::WorkspaceError;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::jobs::Job;

/// Accepted upload extension, compared case-insensitively.
pub const ACCEPTED_EXTENSION: &str = ".mp3";

/// Checks an uploaded filename and returns it without directory components.
pub fn validate_filename(filename: &str) -> Result<String, WorkspaceError> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() || !base.to_ascii_lowercase().ends_with(ACCEPTED_EXTENSION) {
        return Err(WorkspaceError::InvalidUpload {
            filename: filename.to_string(),
        });
    }

    Ok(base.to_string())
}

/// Allocates workspaces under a common temp root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    temp_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
        }
    }

    /// Creates a fresh, uniquely named workspace with empty input and output directories.
    pub async fn create(&self) -> Result<Workspace, WorkspaceError> {
        tokio::fs::create_dir_all(&self.temp_root).await?;

        let session_id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("loudnorm_{}_", session_id))
            .tempdir_in(&self.temp_root)?;

        let input_dir = dir.path().join("input");
        let output_dir = dir.path().join("output");
        tokio::fs::create_dir(&input_dir).await?;
        tokio::fs::create_dir(&output_dir).await?;

        debug!(session_id = %session_id, root = %dir.path().display(), "Workspace created");

        Ok(Workspace {
            session_id,
            dir,
            input_dir,
            output_dir,
        })
    }
}

/// Scratch directory tree owned by a single request.
#[derive(Debug)]
pub struct Workspace {
    session_id: Uuid,
    dir: TempDir,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Workspace {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the normalization archive for this session is written.
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("normalized_audio_{}.zip", self.session_id))
    }

    /// Validates and writes one upload, returning the job for it.
    ///
    /// Each upload gets its own `input/<index>/` directory so equal
    /// filenames within a batch do not collide.
    pub async fn stage_upload(
        &self,
        index: usize,
        filename: &str,
        content: &[u8],
    ) -> Result<Job, WorkspaceError> {
        let filename = validate_filename(filename)?;

        let dir = self.input_dir.join(index.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        let input_path = dir.join(&filename);
        tokio::fs::write(&input_path, content).await?;

        debug!(
            session_id = %self.session_id,
            index,
            filename = %filename,
            bytes = content.len(),
            "Upload staged"
        );

        Ok(Job {
            index,
            filename,
            input_path,
        })
    }

    /// Removes the whole tree. Parts that are already gone are ignored.
    pub fn teardown(self) -> Result<(), WorkspaceError> {
        let session_id = self.session_id;
        match self.dir.close() {
            Ok(()) => {
                debug!(session_id = %session_id, "Workspace removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkspaceError::Io(e)),
        }
    }

    /// Hands the workspace to a guard that tears it down when dropped.
    pub fn into_guard(self) -> TeardownGuard {
        TeardownGuard {
            workspace: Some(self),
        }
    }
}

/// Removes a workspace when dropped.
///
/// Attach it to whatever outlives the handler (e.g. a response body stream)
/// so the files stay on disk until that value is done with them.
#[derive(Debug)]
pub struct TeardownGuard {
    workspace: Option<Workspace>,
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            let session_id = workspace.session_id();
            if let Err(e) = workspace.teardown() {
                warn!(session_id = %session_id, error = %e, "Failed to remove workspace");
            }
        }
    }
}
