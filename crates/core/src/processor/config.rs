//! Configuration for the loudness processor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based loudness processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Value passed to ffmpeg's `-threads` flag.
    #[serde(default = "default_threads")]
    pub ffmpeg_threads: u32,

    /// Maximum jobs of one batch running at the same time.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_jobs: usize,

    /// Timeout for a single analysis in seconds.
    #[serde(default = "default_analyze_timeout")]
    pub analyze_timeout_secs: u64,

    /// Timeout for a single normalization in seconds.
    #[serde(default = "default_normalize_timeout")]
    pub normalize_timeout_secs: u64,

    /// Timeout for the `-version` availability check in seconds.
    #[serde(default = "default_version_timeout")]
    pub version_check_timeout_secs: u64,

    /// Loudness profile applied by both operations.
    #[serde(default)]
    pub target: LoudnessTarget,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_threads() -> u32 {
    4
}

fn default_max_parallel() -> usize {
    4
}

fn default_analyze_timeout() -> u64 {
    60
}

fn default_normalize_timeout() -> u64 {
    300
}

fn default_version_timeout() -> u64 {
    5
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffmpeg_threads: default_threads(),
            max_parallel_jobs: default_max_parallel(),
            analyze_timeout_secs: default_analyze_timeout(),
            normalize_timeout_secs: default_normalize_timeout(),
            version_check_timeout_secs: default_version_timeout(),
            target: LoudnessTarget::default(),
        }
    }
}

impl ProcessorConfig {
    /// Creates a new config pointing at a custom ffmpeg binary.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the analysis and normalization timeouts in seconds.
    pub fn with_timeouts(mut self, analyze_secs: u64, normalize_secs: u64) -> Self {
        self.analyze_timeout_secs = analyze_secs;
        self.normalize_timeout_secs = normalize_secs;
        self
    }
}

/// Target loudness profile and output encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoudnessTarget {
    /// Integrated loudness target in LUFS.
    #[serde(default = "default_integrated")]
    pub integrated_lufs: f64,

    /// Maximum true peak in dBTP.
    #[serde(default = "default_true_peak")]
    pub true_peak_dbtp: f64,

    /// Loudness range target in LU.
    #[serde(default = "default_loudness_range")]
    pub loudness_range_lu: f64,

    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,

    /// Output audio codec passed to `-c:a`.
    #[serde(default = "default_codec")]
    pub codec: String,

    /// Output bitrate in kbit/s.
    #[serde(default = "default_bitrate")]
    pub bitrate_kbps: u32,
}

fn default_integrated() -> f64 {
    -9.0
}

fn default_true_peak() -> f64 {
    0.0
}

fn default_loudness_range() -> f64 {
    11.0
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_codec() -> String {
    "libmp3lame".to_string()
}

fn default_bitrate() -> u32 {
    320
}

impl Default for LoudnessTarget {
    fn default() -> Self {
        Self {
            integrated_lufs: default_integrated(),
            true_peak_dbtp: default_true_peak(),
            loudness_range_lu: default_loudness_range(),
            sample_rate_hz: default_sample_rate(),
            codec: default_codec(),
            bitrate_kbps: default_bitrate(),
        }
    }
}

impl LoudnessTarget {
    /// The `loudnorm` filter expression for this target.
    pub fn loudnorm_filter(&self) -> String {
        format!(
            "loudnorm=I={}:TP={}:LRA={}",
            self.integrated_lufs, self.true_peak_dbtp, self.loudness_range_lu
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessorConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.max_parallel_jobs, 4);
        assert_eq!(config.analyze_timeout_secs, 60);
        assert_eq!(config.normalize_timeout_secs, 300);
        assert_eq!(config.version_check_timeout_secs, 5);
    }

    #[test]
    fn test_config_builder() {
        let config = ProcessorConfig::with_ffmpeg_path(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
            .with_timeouts(10, 20);

        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.max_parallel_jobs, 4);
        assert_eq!(config.analyze_timeout_secs, 10);
        assert_eq!(config.normalize_timeout_secs, 20);
    }

    #[test]
    fn test_default_filter() {
        let target = LoudnessTarget::default();
        assert_eq!(target.loudnorm_filter(), "loudnorm=I=-9:TP=0:LRA=11");
    }

    #[test]
    fn test_fractional_filter() {
        let target = LoudnessTarget {
            integrated_lufs: -14.5,
            true_peak_dbtp: -1.0,
            ..Default::default()
        };
        assert_eq!(target.loudnorm_filter(), "loudnorm=I=-14.5:TP=-1:LRA=11");
    }

    #[test]
    fn test_partial_target_deserialization() {
        let target: LoudnessTarget = serde_json::from_str(r#"{"integrated_lufs": -16}"#).unwrap();
        assert_eq!(target.integrated_lufs, -16.0);
        assert_eq!(target.bitrate_kbps, 320);
        assert_eq!(target.codec, "libmp3lame");
    }
}
