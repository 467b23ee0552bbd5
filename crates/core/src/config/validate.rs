use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upload limits are positive
/// - Worker count and timeouts are positive
/// - Output encoding settings are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }
    if config.server.max_upload_mb == 0 || config.server.max_files_per_request == 0 {
        return Err(ConfigError::ValidationError(
            "server upload limits must be greater than 0".to_string(),
        ));
    }

    // Processor validation
    let processor = &config.processor;
    if processor.max_parallel_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "processor.max_parallel_jobs must be at least 1".to_string(),
        ));
    }
    if processor.analyze_timeout_secs == 0
        || processor.normalize_timeout_secs == 0
        || processor.version_check_timeout_secs == 0
    {
        return Err(ConfigError::ValidationError(
            "processor timeouts must be greater than 0".to_string(),
        ));
    }
    if processor.target.sample_rate_hz == 0 || processor.target.bitrate_kbps == 0 {
        return Err(ConfigError::ValidationError(
            "processor.target sample rate and bitrate must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
