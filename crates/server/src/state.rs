use std::sync::Arc;
use loudnorm_core::{
    Config, JobScheduler, LoudnessProcessor, LoudnessService, WorkspaceManager,
};

/// Shared application state
pub struct AppState {
    config: Config,
    service: Arc<LoudnessService>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<LoudnessService>) -> Self {
        Self { config, service }
    }

    /// Builds the service from configuration around the given processor.
    pub fn with_processor(config: Config, processor: Arc<dyn LoudnessProcessor>) -> Self {
        let service = LoudnessService::new(
            processor,
            WorkspaceManager::new(config.workspace.temp_dir.clone()),
            JobScheduler::new(config.processor.max_parallel_jobs),
        );
        Self::new(config, Arc::new(service))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &LoudnessService {
        self.service.as_ref()
    }
}
