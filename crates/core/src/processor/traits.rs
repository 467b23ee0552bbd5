//! Trait definitions for the processor module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ProcessorError;
use super::types::LoudnessMeasurement;

/// An external tool that can measure and normalize loudness of a single file.
#[async_trait]
pub trait LoudnessProcessor: Send + Sync {
    /// Returns the name of this processor implementation.
    fn name(&self) -> &str;

    /// Measures integrated loudness and true peak of `input`.
    ///
    /// Succeeds whenever the tool itself succeeds, even if one or both
    /// values could not be found in its output.
    async fn analyze(&self, input: &Path) -> Result<LoudnessMeasurement, ProcessorError>;

    /// Re-encodes `input` to `output` at the configured loudness target.
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), ProcessorError>;

    /// Whether the tool can be invoked at all. Never fails.
    async fn check_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct StaticProcessor;

    #[async_trait]
    impl LoudnessProcessor for StaticProcessor {
        fn name(&self) -> &str {
            "static"
        }

        async fn analyze(&self, _input: &Path) -> Result<LoudnessMeasurement, ProcessorError> {
            Ok(LoudnessMeasurement::new("-12.0", "-0.5"))
        }

        async fn normalize(&self, _input: &Path, output: &Path) -> Result<(), ProcessorError> {
            tokio::fs::write(output, b"encoded").await?;
            Ok(())
        }

        async fn check_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_trait_object_analyze() {
        let processor: Arc<dyn LoudnessProcessor> = Arc::new(StaticProcessor);
        let measurement = processor.analyze(Path::new("/in/a.mp3")).await.unwrap();
        assert!(measurement.is_complete());
        assert_eq!(measurement.integrated_lufs.as_deref(), Some("-12.0"));
        assert_eq!(processor.name(), "static");
    }

    #[tokio::test]
    async fn test_trait_object_normalize_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("a_normalized.mp3");
        let processor: Arc<dyn LoudnessProcessor> = Arc::new(StaticProcessor);

        processor
            .normalize(Path::new("/in/a.mp3"), &output)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"encoded");
        assert!(processor.check_available().await);
    }
}
