//! FFmpeg-based processor implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::ProcessorConfig;
use super::error::ProcessorError;
use super::traits::LoudnessProcessor;
use super::types::{LoudnessMeasurement, Operation};

static INTEGRATED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Input Integrated:\s*(\S+)").unwrap());

static TRUE_PEAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Input True Peak:\s*(\S+)").unwrap());

/// FFmpeg-based loudness processor.
pub struct FfmpegProcessor {
    config: ProcessorConfig,
}

impl FfmpegProcessor {
    /// Creates a new FFmpeg processor with the given configuration.
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Creates a processor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ProcessorConfig::default())
    }

    /// Builds ffmpeg arguments for measurement mode.
    fn build_analyze_args(&self, input: &Path) -> Vec<String> {
        vec![
            "-threads".to_string(),
            self.config.ffmpeg_threads.to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-af".to_string(),
            format!("{}:print_format=summary", self.config.target.loudnorm_filter()),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ]
    }

    /// Builds ffmpeg arguments for transform mode.
    fn build_normalize_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let target = &self.config.target;
        vec![
            "-y".to_string(), // Overwrite output
            "-threads".to_string(),
            self.config.ffmpeg_threads.to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-af".to_string(),
            target.loudnorm_filter(),
            "-ar".to_string(),
            target.sample_rate_hz.to_string(),
            "-c:a".to_string(),
            target.codec.clone(),
            "-b:a".to_string(),
            format!("{}k", target.bitrate_kbps),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Extracts loudness values from the `loudnorm` summary printed on stderr.
    ///
    /// The last matching line wins.
    fn parse_summary(stderr: &str) -> LoudnessMeasurement {
        let mut measurement = LoudnessMeasurement::default();

        for line in stderr.lines() {
            if let Some(caps) = INTEGRATED_RE.captures(line) {
                measurement.integrated_lufs = caps.get(1).map(|m| m.as_str().to_string());
            }
            if let Some(caps) = TRUE_PEAK_RE.captures(line) {
                measurement.true_peak_dbtp = caps.get(1).map(|m| m.as_str().to_string());
            }
        }

        measurement
    }

    /// Runs ffmpeg, collecting stderr until exit or timeout.
    async fn run(
        &self,
        operation: Operation,
        args: &[String],
        timeout_secs: u64,
    ) -> Result<(ExitStatus, String), ProcessorError> {
        let start = Instant::now();

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProcessorError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ProcessorError::Io(e)
                }
            })?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("ffmpeg stderr was not captured"))?;

        let result = timeout(Duration::from_secs(timeout_secs), async {
            let mut output = Vec::new();
            stderr.read_to_end(&mut output).await?;
            let status = child.wait().await?;
            Ok::<(ExitStatus, Vec<u8>), std::io::Error>((status, output))
        })
        .await;

        match result {
            Ok(Ok((status, output))) => {
                debug!(
                    operation = operation.as_str(),
                    exit_code = ?status.code(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "ffmpeg finished"
                );
                Ok((status, String::from_utf8_lossy(&output).into_owned()))
            }
            Ok(Err(e)) => Err(ProcessorError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed out ffmpeg process");
                }
                Err(ProcessorError::Timeout {
                    operation,
                    timeout_secs,
                })
            }
        }
    }
}

#[async_trait]
impl LoudnessProcessor for FfmpegProcessor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn analyze(&self, input: &Path) -> Result<LoudnessMeasurement, ProcessorError> {
        let args = self.build_analyze_args(input);
        let (status, stderr) = self
            .run(Operation::Analyze, &args, self.config.analyze_timeout_secs)
            .await?;

        if !status.success() {
            return Err(ProcessorError::failed(
                Operation::Analyze,
                status.code(),
                stderr,
            ));
        }

        let measurement = Self::parse_summary(&stderr);
        if !measurement.is_complete() {
            debug!(input = %input.display(), "loudnorm summary incomplete");
        }
        Ok(measurement)
    }

    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), ProcessorError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_normalize_args(input, output);
        let (status, stderr) = self
            .run(Operation::Normalize, &args, self.config.normalize_timeout_secs)
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(ProcessorError::failed(
                Operation::Normalize,
                status.code(),
                stderr,
            ))
        }
    }

    async fn check_available(&self) -> bool {
        let check = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match timeout(
            Duration::from_secs(self.config.version_check_timeout_secs),
            check,
        )
        .await
        {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!(error = %e, "ffmpeg version check failed");
                false
            }
            Err(_) => {
                debug!("ffmpeg version check timed out");
                false
            }
        }
    }
}
