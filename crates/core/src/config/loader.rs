use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `LOUDNORM_SERVER__PORT=9000`.
const ENV_PREFIX: &str = "LOUDNORM_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load defaults with environment variable overrides only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[server]
port = "eight thousand"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        // Runs inside a jail so concurrent env overrides cannot leak in.
        figment::Jail::expect_with(|_jail| {
            let mut temp_file = NamedTempFile::new().unwrap();
            writeln!(
                temp_file,
                r#"
[server]
host = "127.0.0.1"
port = 3000

[processor]
normalize_timeout_secs = 120
"#
            )
            .unwrap();

            let config = load_config(temp_file.path()).unwrap();
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.server.host.to_string(), "127.0.0.1");
            assert_eq!(config.processor.normalize_timeout_secs, 120);
            assert_eq!(config.processor.analyze_timeout_secs, 60);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "loudnorm.toml",
                r#"
[server]
port = 3000
"#,
            )?;
            jail.set_env("LOUDNORM_SERVER__PORT", "4000");
            jail.set_env("LOUDNORM_PROCESSOR__MAX_PARALLEL_JOBS", "2");

            let config = load_config(Path::new("loudnorm.toml")).unwrap();
            assert_eq!(config.server.port, 4000);
            assert_eq!(config.processor.max_parallel_jobs, 2);

            let env_only = load_config_from_env().unwrap();
            assert_eq!(env_only.server.port, 4000);
            Ok(())
        });
    }
}
