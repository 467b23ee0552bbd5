//! Bounded fan-out of a batch of jobs.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::metrics::{BATCH_SIZE, JOBS_ACTIVE, JOBS_TOTAL, JOB_DURATION};
use crate::processor::Operation;

use super::types::{Job, JobOutcome, JobStatus};

/// Error type for scheduler operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The worker pool could not hand out a slot.
    #[error("Worker pool is closed")]
    PoolClosed,
}

/// Per-status counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl BatchSummary {
    /// Counts outcomes by status.
    pub fn from_outcomes<T: JobOutcome>(outcomes: &[T]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                summary.total += 1;
                match outcome.status() {
                    JobStatus::Success => summary.succeeded += 1,
                    JobStatus::Error => summary.failed += 1,
                    JobStatus::Timeout => summary.timed_out += 1,
                }
                summary
            })
    }
}

/// Runs batches of independent jobs with a fixed number of concurrent workers.
#[derive(Debug, Clone)]
pub struct JobScheduler {
    max_parallel: usize,
}

impl JobScheduler {
    /// Creates a scheduler allowing `max_parallel` jobs at once (at least one).
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    /// Returns the worker limit.
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Runs every job through `worker` and returns outcomes in job order.
    ///
    /// Each job is attempted exactly once. Jobs never cancel each other; a
    /// worker that panics is reported as an `error` outcome for its job.
    pub async fn run_batch<T, F, Fut>(
        &self,
        operation: Operation,
        jobs: Vec<Job>,
        worker: F,
    ) -> Result<Vec<T>, SchedulerError>
    where
        T: JobOutcome,
        F: Fn(Job) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let start = Instant::now();
        let label = operation.as_str();
        BATCH_SIZE
            .with_label_values(&[label])
            .observe(jobs.len() as f64);

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let worker = Arc::new(worker);
        let mut handles = Vec::with_capacity(jobs.len());
        let mut submitted = Vec::with_capacity(jobs.len());

        for job in jobs {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| SchedulerError::PoolClosed)?;

            let worker = Arc::clone(&worker);
            let task_job = job.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let active = JOBS_ACTIVE.with_label_values(&[label]);
                active.inc();
                let started = Instant::now();
                let outcome = worker(task_job).await;
                active.dec();
                (outcome, started.elapsed())
            }));
            submitted.push(job);
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (job, handle) in submitted.iter().zip(handles) {
            let (outcome, elapsed) = match handle.await {
                Ok(finished) => finished,
                Err(e) => {
                    error!(
                        operation = label,
                        filename = %job.filename,
                        error = %e,
                        "Job worker died"
                    );
                    JOBS_ACTIVE.with_label_values(&[label]).dec();
                    (
                        T::crashed(job, format!("Job failed unexpectedly: {}", e)),
                        Duration::ZERO,
                    )
                }
            };
            record_job(label, outcome.status(), elapsed);
            outcomes.push(outcome);
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!(
            operation = label,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            timed_out = summary.timed_out,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch finished"
        );

        Ok(outcomes)
    }
}

fn record_job(operation: &str, status: JobStatus, elapsed: Duration) {
    JOBS_TOTAL
        .with_label_values(&[operation, status.as_str()])
        .inc();
    JOB_DURATION
        .with_label_values(&[operation, status.as_str()])
        .observe(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::AnalysisOutcome;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn jobs(names: &[&str]) -> Vec<Job> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| Job {
                index,
                filename: name.to_string(),
                input_path: PathBuf::from(format!("/ws/input/{}/{}", index, name)),
            })
            .collect()
    }

    fn success(job: &Job) -> AnalysisOutcome {
        AnalysisOutcome {
            filename: job.filename.clone(),
            lufs: Some("-9.0".to_string()),
            tp: Some("0.0".to_string()),
            status: JobStatus::Success,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_order_matches_submission_not_completion() {
        let scheduler = JobScheduler::new(4);
        let batch = jobs(&["slow.mp3", "medium.mp3", "fast.mp3"]);

        let outcomes: Vec<AnalysisOutcome> = scheduler
            .run_batch(Operation::Analyze, batch, |job| async move {
                let delay = match job.filename.as_str() {
                    "slow.mp3" => 60,
                    "medium.mp3" => 30,
                    _ => 0,
                };
                sleep(Duration::from_millis(delay)).await;
                success(&job)
            })
            .await
            .unwrap();

        let names: Vec<&str> = outcomes.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(names, vec!["slow.mp3", "medium.mp3", "fast.mp3"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let scheduler = JobScheduler::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (running_w, peak_w) = (Arc::clone(&running), Arc::clone(&peak));
        let outcomes: Vec<AnalysisOutcome> = scheduler
            .run_batch(
                Operation::Analyze,
                jobs(&["a.mp3", "b.mp3", "c.mp3", "d.mp3", "e.mp3"]),
                move |job| {
                    let running = Arc::clone(&running_w);
                    let peak = Arc::clone(&peak_w);
                    async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        sleep(Duration::from_millis(20)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        success(&job)
                    }
                },
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_job_attempted_once() {
        let scheduler = JobScheduler::new(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let outcomes: Vec<AnalysisOutcome> = scheduler
            .run_batch(
                Operation::Analyze,
                jobs(&["a.mp3", "b.mp3", "c.mp3", "d.mp3"]),
                move |job| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async move { success(&job) }
                },
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_panicking_worker_becomes_error_outcome() {
        let scheduler = JobScheduler::new(2);

        let outcomes: Vec<AnalysisOutcome> = scheduler
            .run_batch(
                Operation::Analyze,
                jobs(&["ok.mp3", "boom.mp3", "also_ok.mp3"]),
                |job| async move {
                    if job.filename == "boom.mp3" {
                        panic!("decoder exploded");
                    }
                    success(&job)
                },
            )
            .await
            .unwrap();

        assert_eq!(outcomes[0].status, JobStatus::Success);
        assert_eq!(outcomes[1].status, JobStatus::Error);
        assert_eq!(outcomes[1].filename, "boom.mp3");
        assert!(outcomes[1]
            .error
            .as_deref()
            .unwrap()
            .starts_with("Job failed unexpectedly"));
        assert_eq!(outcomes[2].status, JobStatus::Success);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let scheduler = JobScheduler::new(4);
        let outcomes: Vec<AnalysisOutcome> = scheduler
            .run_batch(Operation::Analyze, Vec::new(), |job| async move {
                success(&job)
            })
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_zero_parallelism_is_clamped() {
        assert_eq!(JobScheduler::new(0).max_parallel(), 1);
    }

    #[test]
    fn test_batch_summary() {
        let batch = jobs(&["a.mp3", "b.mp3", "c.mp3"]);
        let mut outcomes: Vec<AnalysisOutcome> = batch.iter().map(success).collect();
        outcomes[1].status = JobStatus::Timeout;
        outcomes[2].status = JobStatus::Error;

        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                succeeded: 1,
                failed: 1,
                timed_out: 1,
            }
        );
    }
}
