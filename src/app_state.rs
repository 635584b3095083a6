use std::sync::Arc;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    services::{
        capability_registry::CapabilityRegistry,
        code_runner::PythonCodeRunner,
        fallback_submitter::HttpFallbackSubmitter,
        page_fetcher::HttpPageFetcher,
        question_clock::QuestionBudget,
        sequence_controller::{SequenceController, SolverServices},
        solution_generator::OpenAiSolutionGenerator,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub services: SolverServices,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let registry = match CapabilityRegistry::default()
            .probe(&config.python_cmd)
            .await
        {
            Ok(registry) => registry,
            Err(e) => {
                log::warn!("Capability probe failed, keeping every entry: {}", e);
                CapabilityRegistry::default()
            }
        };

        let http_client = reqwest::Client::builder()
            .timeout(config.page_fetch_timeout())
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let credentials = config.credentials();
        let services = SolverServices {
            fetcher: Arc::new(HttpPageFetcher::new(http_client.clone())),
            generator: Arc::new(OpenAiSolutionGenerator::from_config(&config)),
            runner: Arc::new(PythonCodeRunner::new(
                config.python_cmd.clone(),
                &registry,
                credentials.clone(),
                config.execution_timeout(),
            )),
            submitter: Arc::new(HttpFallbackSubmitter::new(http_client, credentials)),
        };

        Ok(Self::with_services(config, services))
    }

    pub fn with_services(config: Config, services: SolverServices) -> Self {
        Self {
            config: Arc::new(config),
            services,
        }
    }

    /// A controller for one chain; chains share adapters but nothing else.
    pub fn sequence_controller(&self, chain_id: impl Into<String>) -> SequenceController {
        SequenceController::new(
            chain_id,
            self.services.clone(),
            QuestionBudget::from_config(&self.config),
        )
    }
}
