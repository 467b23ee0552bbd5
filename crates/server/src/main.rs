use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use loudnorm_core::{
    load_config, load_config_from_env, validate_config, Config, FfmpegProcessor, LogFormat,
    LoudnessProcessor,
};
use loudnorm_server::{create_router, AppState};

/// Default tracing filter when neither `RUST_LOG` nor `log.filter` is set
const DEFAULT_FILTER: &str = "info,tower_http=debug";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("LOUDNORM_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration, falling back to defaults when no file is present
    let config = if config_path.exists() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        load_config_from_env().context("Failed to load config from environment")?
    };

    init_tracing(&config);

    if config_path.exists() {
        info!("Configuration loaded from {:?}", config_path);
    } else {
        info!("No config file at {:?}, using defaults", config_path);
    }

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("ffmpeg binary: {:?}", config.processor.ffmpeg_path);
    info!("Max parallel jobs: {}", config.processor.max_parallel_jobs);
    info!("Workspace root: {:?}", config.workspace.temp_dir);

    tokio::fs::create_dir_all(&config.workspace.temp_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", config.workspace.temp_dir))?;

    let processor: Arc<dyn LoudnessProcessor> =
        Arc::new(FfmpegProcessor::new(config.processor.clone()));
    if processor.check_available().await {
        info!("Using processor: {}", processor.name());
    } else {
        warn!("ffmpeg is not available, requests will fail until it is installed");
    }

    // Create app state
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::with_processor(config, processor));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

fn init_tracing(config: &Config) {
    let fallback = config
        .log
        .filter
        .clone()
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.log.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
