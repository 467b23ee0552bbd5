//! Testing utilities and mock implementations.
//!
//! This module provides a scripted stand-in for the external tool so the
//! scheduler, aggregator and HTTP handlers can be exercised without ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use loudnorm_core::testing::{MockProcessor, ScriptedOutcome};
//!
//! let processor = MockProcessor::new();
//! processor.script("broken.mp3", ScriptedOutcome::failure("Invalid data")).await;
//!
//! // Use in LoudnessService / AppState...
//! ```

mod mock_processor;

pub use mock_processor::{MockProcessor, ScriptedOutcome};
