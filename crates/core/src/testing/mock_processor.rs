//! Mock processor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::processor::{LoudnessMeasurement, LoudnessProcessor, Operation, ProcessorError};

/// What the mock should report for a given filename.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// The tool succeeds; analysis reports these values.
    Success(LoudnessMeasurement),
    /// The tool exits non-zero with this stderr.
    Failure(String),
    /// The tool exceeds its time limit.
    Timeout,
    /// The tool exits zero but leaves no output file behind.
    NoOutput,
}

impl ScriptedOutcome {
    /// Success with both values present.
    pub fn measured(lufs: &str, tp: &str) -> Self {
        Self::Success(LoudnessMeasurement::new(lufs, tp))
    }

    /// Non-zero exit with the given stderr.
    pub fn failure(stderr: impl Into<String>) -> Self {
        Self::Failure(stderr.into())
    }
}

/// Mock implementation of the LoudnessProcessor trait.
///
/// Provides controllable behavior for testing:
/// - Script per-filename outcomes (success, failure, timeout, missing output)
/// - Delay individual files to shuffle completion order
/// - Track analyze/normalize calls for assertions
/// - Toggle the availability reported to health checks
///
/// Unscripted files succeed with `-9.0 LUFS / 0.0 dBTP`; a successful
/// normalize writes a small placeholder file at the output path.
///
/// # Example
///
/// ```rust,ignore
/// use loudnorm_core::testing::{MockProcessor, ScriptedOutcome};
///
/// let processor = MockProcessor::new();
/// processor.script("broken.mp3", ScriptedOutcome::failure("Invalid data")).await;
/// processor.set_delay("slow.mp3", Duration::from_millis(50)).await;
///
/// let calls = processor.normalize_calls().await;
/// ```
#[derive(Debug)]
pub struct MockProcessor {
    /// Scripted outcomes keyed by input filename.
    scripts: Arc<RwLock<HashMap<String, ScriptedOutcome>>>,
    /// Artificial delays keyed by input filename.
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Inputs passed to `analyze`.
    analyze_calls: Arc<RwLock<Vec<PathBuf>>>,
    /// (input, output) pairs passed to `normalize`.
    normalize_calls: Arc<RwLock<Vec<(PathBuf, PathBuf)>>>,
    /// Value returned by `check_available`.
    available: Arc<RwLock<bool>>,
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessor {
    /// Create a new mock processor.
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(HashMap::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            analyze_calls: Arc::new(RwLock::new(Vec::new())),
            normalize_calls: Arc::new(RwLock::new(Vec::new())),
            available: Arc::new(RwLock::new(true)),
        }
    }

    /// Script the outcome for a filename.
    pub async fn script(&self, filename: impl Into<String>, outcome: ScriptedOutcome) {
        self.scripts.write().await.insert(filename.into(), outcome);
    }

    /// Delay every call for a filename.
    pub async fn set_delay(&self, filename: impl Into<String>, delay: Duration) {
        self.delays.write().await.insert(filename.into(), delay);
    }

    /// Set whether the tool is reported as available.
    pub async fn set_available(&self, available: bool) {
        *self.available.write().await = available;
    }

    /// Get all inputs passed to `analyze`.
    pub async fn analyze_calls(&self) -> Vec<PathBuf> {
        self.analyze_calls.read().await.clone()
    }

    /// Get all (input, output) pairs passed to `normalize`.
    pub async fn normalize_calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.normalize_calls.read().await.clone()
    }

    /// Total number of processor invocations.
    pub async fn call_count(&self) -> usize {
        self.analyze_calls.read().await.len() + self.normalize_calls.read().await.len()
    }

    /// Looks up the script for `input`, waiting out any configured delay.
    async fn resolve(&self, input: &Path) -> ScriptedOutcome {
        let filename = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let delay = self.delays.read().await.get(&filename).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.scripts
            .read()
            .await
            .get(&filename)
            .cloned()
            .unwrap_or_else(|| ScriptedOutcome::measured("-9.0", "0.0"))
    }
}

#[async_trait]
impl LoudnessProcessor for MockProcessor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, input: &Path) -> Result<LoudnessMeasurement, ProcessorError> {
        self.analyze_calls.write().await.push(input.to_path_buf());

        match self.resolve(input).await {
            ScriptedOutcome::Success(measurement) => Ok(measurement),
            ScriptedOutcome::NoOutput => Ok(LoudnessMeasurement::default()),
            ScriptedOutcome::Failure(stderr) => {
                Err(ProcessorError::failed(Operation::Analyze, Some(1), stderr))
            }
            ScriptedOutcome::Timeout => Err(ProcessorError::Timeout {
                operation: Operation::Analyze,
                timeout_secs: 60,
            }),
        }
    }

    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), ProcessorError> {
        self.normalize_calls
            .write()
            .await
            .push((input.to_path_buf(), output.to_path_buf()));

        match self.resolve(input).await {
            ScriptedOutcome::Success(_) => {
                if let Some(parent) = output.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(output, b"ID3 normalized").await?;
                Ok(())
            }
            ScriptedOutcome::NoOutput => Ok(()),
            ScriptedOutcome::Failure(stderr) => {
                Err(ProcessorError::failed(Operation::Normalize, Some(1), stderr))
            }
            ScriptedOutcome::Timeout => Err(ProcessorError::Timeout {
                operation: Operation::Normalize,
                timeout_secs: 300,
            }),
        }
    }

    async fn check_available(&self) -> bool {
        *self.available.read().await
    }
}
