//! Request-level orchestration of the analyze and normalize operations.
//!
//! A request moves through `received → staged → scheduled → aggregated →
//! responded`; any step can fail instead. On failure the request's workspace
//! is removed before the error is returned. A successful normalization hands
//! its workspace to a [`TeardownGuard`] so the archive stays on disk until
//! the caller is done sending it.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::{self, AggregateError, ArchiveSummary};
use crate::jobs::{
    analyze_job, normalize_job, AnalysisOutcome, Job, JobScheduler, NormalizationOutcome,
    SchedulerError,
};
use crate::metrics::BATCHES_TOTAL;
use crate::processor::{LoudnessProcessor, Operation};
use crate::workspace::{validate_filename, TeardownGuard, Workspace, WorkspaceError, WorkspaceManager};

/// Errors surfaced to request handlers.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request carried no files.
    #[error("No files uploaded")]
    NoFiles,

    /// Staging failed (including rejected uploads).
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The worker pool could not run the batch.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Aggregation failed (including "every job failed").
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl ServiceError {
    /// Whether the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoFiles | Self::Workspace(WorkspaceError::InvalidUpload { .. })
        )
    }

    fn metric_label(&self) -> &'static str {
        match self {
            Self::NoFiles | Self::Workspace(WorkspaceError::InvalidUpload { .. }) => "rejected",
            Self::Aggregate(AggregateError::AllJobsFailed { .. }) => "all_failed",
            _ => "error",
        }
    }
}

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Result of a successful normalization request.
///
/// Owns the request's workspace; dropping it removes the archive.
#[derive(Debug)]
pub struct NormalizedArchive {
    pub session_id: Uuid,
    pub archive: ArchiveSummary,
    /// Jobs that did not make it into the archive.
    pub failures: Vec<NormalizationOutcome>,
    guard: TeardownGuard,
}

impl NormalizedArchive {
    /// Number of files in the archive.
    pub fn file_count(&self) -> usize {
        self.archive.entries.len()
    }

    /// Filename offered to the client for download.
    pub fn download_name(&self) -> String {
        format!("normalized_audio_{}_files.zip", self.file_count())
    }

    pub fn path(&self) -> &Path {
        &self.archive.path
    }

    /// Gives up the archive metadata and the guard that removes it.
    pub fn into_parts(self) -> (ArchiveSummary, TeardownGuard) {
        (self.archive, self.guard)
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Received,
    Staged,
    Scheduled,
    Aggregated,
    Responded,
    Failed,
}

impl Phase {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Staged => "staged",
            Self::Scheduled => "scheduled",
            Self::Aggregated => "aggregated",
            Self::Responded => "responded",
            Self::Failed => "failed",
        }
    }
}

fn enter(operation: Operation, session_id: Option<Uuid>, phase: Phase) {
    debug!(
        operation = operation.as_str(),
        session_id = ?session_id,
        phase = phase.as_str(),
        "Request phase"
    );
}

/// Runs analyze and normalize requests against a processor.
pub struct LoudnessService {
    processor: Arc<dyn LoudnessProcessor>,
    workspaces: WorkspaceManager,
    scheduler: JobScheduler,
}

impl LoudnessService {
    pub fn new(
        processor: Arc<dyn LoudnessProcessor>,
        workspaces: WorkspaceManager,
        scheduler: JobScheduler,
    ) -> Self {
        Self {
            processor,
            workspaces,
            scheduler,
        }
    }

    /// Whether the external tool can be invoked.
    pub async fn tool_available(&self) -> bool {
        self.processor.check_available().await
    }

    /// Measures every upload. Per-file failures are reported in the outcomes.
    pub async fn analyze(&self, uploads: Vec<Upload>) -> Result<Vec<AnalysisOutcome>, ServiceError> {
        let operation = Operation::Analyze;
        enter(operation, None, Phase::Received);
        let result = self.run_analyze(uploads).await;
        record_batch(operation, &result);
        result
    }

    async fn run_analyze(&self, uploads: Vec<Upload>) -> Result<Vec<AnalysisOutcome>, ServiceError> {
        let operation = Operation::Analyze;
        validate_uploads(&uploads)?;

        // Removed on drop if anything below fails.
        let workspace = self.workspaces.create().await?;
        let session_id = Some(workspace.session_id());

        let jobs = stage_all(&workspace, uploads).await?;
        enter(operation, session_id, Phase::Staged);

        let processor = Arc::clone(&self.processor);
        let outcomes = self
            .scheduler
            .run_batch(operation, jobs, move |job| {
                analyze_job(Arc::clone(&processor), job)
            })
            .await?;
        enter(operation, session_id, Phase::Scheduled);
        enter(operation, session_id, Phase::Aggregated);

        if let Err(e) = workspace.teardown() {
            warn!(error = %e, "Failed to remove analysis workspace");
        }
        enter(operation, session_id, Phase::Responded);
        Ok(outcomes)
    }

    /// Normalizes every upload and packs the successes into one archive.
    ///
    /// Fails if nothing succeeded. The workspace is removed before any error
    /// is returned.
    pub async fn normalize(&self, uploads: Vec<Upload>) -> Result<NormalizedArchive, ServiceError> {
        let operation = Operation::Normalize;
        enter(operation, None, Phase::Received);

        let result = match validate_uploads(&uploads) {
            Ok(()) => self.run_normalize(uploads).await,
            Err(e) => Err(e),
        };
        record_batch(operation, &result);
        result
    }

    async fn run_normalize(&self, uploads: Vec<Upload>) -> Result<NormalizedArchive, ServiceError> {
        let operation = Operation::Normalize;
        let workspace = self.workspaces.create().await?;
        let session_id = workspace.session_id();

        match self.normalize_in(&workspace, uploads).await {
            Ok((archive, failures)) => {
                enter(operation, Some(session_id), Phase::Responded);
                info!(
                    session_id = %session_id,
                    files = archive.entries.len(),
                    failed = failures.len(),
                    "Normalization archive ready"
                );
                Ok(NormalizedArchive {
                    session_id,
                    archive,
                    failures,
                    guard: workspace.into_guard(),
                })
            }
            Err(e) => {
                enter(operation, Some(session_id), Phase::Failed);
                if let Err(cleanup) = workspace.teardown() {
                    warn!(session_id = %session_id, error = %cleanup, "Failed to remove workspace");
                }
                Err(e)
            }
        }
    }

    async fn normalize_in(
        &self,
        workspace: &Workspace,
        uploads: Vec<Upload>,
    ) -> Result<(ArchiveSummary, Vec<NormalizationOutcome>), ServiceError> {
        let operation = Operation::Normalize;
        let session_id = Some(workspace.session_id());

        let jobs = stage_all(workspace, uploads).await?;
        enter(operation, session_id, Phase::Staged);

        let processor = Arc::clone(&self.processor);
        let output_dir = workspace.output_dir().to_path_buf();
        let outcomes = self
            .scheduler
            .run_batch(operation, jobs, move |job| {
                let processor = Arc::clone(&processor);
                let output_dir = output_dir.clone();
                async move { normalize_job(processor, &output_dir, job).await }
            })
            .await?;
        enter(operation, session_id, Phase::Scheduled);

        let parts = aggregate::partition(outcomes);
        if !parts.failures.is_empty() {
            warn!(
                session_id = ?session_id,
                failures = %parts.failure_summary(),
                "Some files failed to normalize"
            );
        }
        let parts = parts.require_success()?;

        let archive =
            aggregate::build_archive(parts.output_paths(), workspace.archive_path()).await?;
        enter(operation, session_id, Phase::Aggregated);

        Ok((archive, parts.failures))
    }
}

fn validate_uploads(uploads: &[Upload]) -> Result<(), ServiceError> {
    if uploads.is_empty() {
        return Err(ServiceError::NoFiles);
    }
    for upload in uploads {
        validate_filename(&upload.filename)?;
    }
    Ok(())
}

async fn stage_all(workspace: &Workspace, uploads: Vec<Upload>) -> Result<Vec<Job>, ServiceError> {
    let mut jobs = Vec::with_capacity(uploads.len());
    for (index, upload) in uploads.into_iter().enumerate() {
        jobs.push(
            workspace
                .stage_upload(index, &upload.filename, &upload.content)
                .await?,
        );
    }
    Ok(jobs)
}

fn record_batch<T>(operation: Operation, result: &Result<T, ServiceError>) {
    let label = match result {
        Ok(_) => "completed",
        Err(e) => e.metric_label(),
    };
    BATCHES_TOTAL
        .with_label_values(&[operation.as_str(), label])
        .inc();
}
