//! Worker functions that run one job through a processor.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::processor::LoudnessProcessor;

use super::types::{AnalysisOutcome, Job, JobOutcome, NormalizationOutcome};

/// Measures one staged file.
pub async fn analyze_job(processor: Arc<dyn LoudnessProcessor>, job: Job) -> AnalysisOutcome {
    let result = processor.analyze(&job.input_path).await;
    let outcome = AnalysisOutcome::from_result(&job, result);
    log_outcome(&job, &outcome);
    outcome
}

/// Normalizes one staged file into `output_dir/<index>/<stem>_normalized.mp3`.
pub async fn normalize_job(
    processor: Arc<dyn LoudnessProcessor>,
    output_dir: &Path,
    job: Job,
) -> NormalizationOutcome {
    let output_path = output_dir
        .join(job.index.to_string())
        .join(job.normalized_filename());
    let result = processor.normalize(&job.input_path, &output_path).await;
    let outcome = NormalizationOutcome::from_result(&job, output_path, result);
    log_outcome(&job, &outcome);
    outcome
}

fn log_outcome<T: JobOutcome>(job: &Job, outcome: &T) {
    if outcome.status().is_success() {
        debug!(index = job.index, filename = %job.filename, "Job succeeded");
    } else {
        warn!(
            index = job.index,
            filename = %job.filename,
            status = %outcome.status(),
            message = outcome.message().unwrap_or_default(),
            "Job failed"
        );
    }
}
