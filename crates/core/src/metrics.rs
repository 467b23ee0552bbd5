//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (per-file runs of the external tool)
//! - Batches (one per request)
//! - Archives built for normalization responses

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs total by operation and status.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("loudnorm_jobs_total", "Total jobs run through the processor"),
        &["operation", "status"], // "analyze"/"normalize", "success"/"error"/"timeout"
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("loudnorm_job_duration_seconds", "Duration of single jobs")
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["operation", "status"],
    )
    .unwrap()
});

/// Jobs currently holding a worker slot.
pub static JOBS_ACTIVE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("loudnorm_jobs_active", "Jobs currently running"),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batch size in files.
pub static BATCH_SIZE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("loudnorm_batch_size", "Number of files per batch")
            .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]),
        &["operation"],
    )
    .unwrap()
});

/// Batches total by operation and result.
pub static BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("loudnorm_batches_total", "Total batches processed"),
        &["operation", "result"], // "completed", "all_failed", "error"
    )
    .unwrap()
});

/// Archive size in bytes.
pub static ARCHIVE_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("loudnorm_archive_bytes", "Size of generated archives")
            .buckets(prometheus::exponential_buckets(1_048_576.0, 2.0, 10).unwrap()),
        &[],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        // Batches
        Box::new(BATCH_SIZE.clone()),
        Box::new(BATCHES_TOTAL.clone()),
        Box::new(ARCHIVE_BYTES.clone()),
    ]
}
