//! Dependency initialization and wiring for the indexer.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::settings::{ConnectionMode, IndexerSettings};
use crate::loader::{IndexLifecycleManager, SearchLoader};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::processor::OperationTranslator;
use crate::IndexingError;
use spacetime_indexer_repository::{IndexConfig, OpenSearchProvider, SearchIndexProvider};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    pub settings: IndexerSettings,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`IndexerSettings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If configuration is missing or the engine
    ///   cannot be reached in fail-fast mode
    pub async fn new() -> Result<Self, IndexingError> {
        let settings = IndexerSettings::from_env()?;
        Self::from_settings(settings).await
    }

    /// Initialize all dependencies from explicit settings.
    pub async fn from_settings(settings: IndexerSettings) -> Result<Self, IndexingError> {
        let url = settings.url();

        info!(
            search_url = %url,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            max_batch_size = ?settings.max_batch_size,
            "Initializing dependencies"
        );

        let provider = Self::connect_to_search(
            &url,
            settings.index_config.clone(),
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        info!("Search engine connection established");

        let provider: Arc<dyn SearchIndexProvider> = Arc::new(provider);

        let orchestrator = Orchestrator::with_config(
            OperationTranslator::default(),
            SearchLoader::new(provider.clone()),
            IndexLifecycleManager::new(provider, settings.index_config.clone()),
            OrchestratorConfig {
                max_batch_size: settings.max_batch_size,
            },
        );

        Ok(Self {
            orchestrator,
            settings,
        })
    }

    /// Connect to the search engine with retry logic based on connection mode.
    async fn connect_to_search(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        loop {
            match Self::try_connect(url, index_config.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to search engine: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            search_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to search engine, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Create the provider and ping the engine once.
    async fn try_connect(
        url: &str,
        index_config: IndexConfig,
    ) -> Result<OpenSearchProvider, IndexingError> {
        let provider = OpenSearchProvider::new(url, index_config)
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create search provider: {}", e))
            })?;

        provider
            .check_connection()
            .await
            .map_err(|e| IndexingError::config(e.to_string()))?;

        Ok(provider)
    }
}
