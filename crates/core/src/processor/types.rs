//! Types shared by processor implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which mode the external tool was run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Analyze,
    Normalize,
}

impl Operation {
    /// Message reported to clients when a job of this kind times out.
    pub fn timeout_message(&self) -> &'static str {
        match self {
            Self::Analyze => "Analysis timed out",
            Self::Normalize => "Normalization timed out",
        }
    }

    /// Label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
            Self::Normalize => "normalize",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analyze => write!(f, "Analysis"),
            Self::Normalize => write!(f, "Normalization"),
        }
    }
}

/// Loudness values reported by the tool in measurement mode.
///
/// Values are kept as the tool printed them (`"-14.2"`, `"-inf"`), without
/// the unit suffix. A missing summary line leaves the field `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoudnessMeasurement {
    /// Input integrated loudness in LUFS.
    pub integrated_lufs: Option<String>,
    /// Input true peak in dBTP.
    pub true_peak_dbtp: Option<String>,
}

impl LoudnessMeasurement {
    /// Creates a measurement with both values present.
    pub fn new(integrated_lufs: impl Into<String>, true_peak_dbtp: impl Into<String>) -> Self {
        Self {
            integrated_lufs: Some(integrated_lufs.into()),
            true_peak_dbtp: Some(true_peak_dbtp.into()),
        }
    }

    /// Whether both values were found.
    pub fn is_complete(&self) -> bool {
        self.integrated_lufs.is_some() && self.true_peak_dbtp.is_some()
    }
}
