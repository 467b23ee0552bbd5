//! Processor module wrapping the external loudness tool.
//!
//! This module provides the `LoudnessProcessor` trait and an FFmpeg-backed
//! implementation that measures loudness with the `loudnorm` filter and
//! re-encodes files to a fixed loudness target.
//!
//! # Example
//!
//! ```ignore
//! use loudnorm_core::processor::{FfmpegProcessor, LoudnessProcessor, ProcessorConfig};
//!
//! let processor = FfmpegProcessor::new(ProcessorConfig::default());
//!
//! if processor.check_available().await {
//!     let measurement = processor.analyze(Path::new("/path/to/song.mp3")).await?;
//!     println!("{:?} LUFS", measurement.integrated_lufs);
//!
//!     processor
//!         .normalize(Path::new("/path/to/song.mp3"), Path::new("/path/to/out.mp3"))
//!         .await?;
//! }
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::{LoudnessTarget, ProcessorConfig};
pub use error::ProcessorError;
pub use ffmpeg::FfmpegProcessor;
pub use traits::LoudnessProcessor;
pub use types::{LoudnessMeasurement, Operation};
