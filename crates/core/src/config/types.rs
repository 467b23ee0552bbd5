use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::processor::ProcessorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Documented per-file size limit in MB (not checked per file).
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    /// Number of files a request body is sized for.
    #[serde(default = "default_max_files")]
    pub max_files_per_request: usize,
    /// Origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Request body limit in bytes.
    pub fn body_limit_bytes(&self) -> usize {
        self.max_upload_mb
            .saturating_mul(self.max_files_per_request)
            .saturating_mul(1024 * 1024)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
            max_files_per_request: default_max_files(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_mb() -> usize {
    50
}

fn default_max_files() -> usize {
    20
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

/// Where per-request workspaces are created
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("loudnorm")
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Fallback filter when `RUST_LOG` is not set.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
