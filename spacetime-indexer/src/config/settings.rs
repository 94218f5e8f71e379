//! Settings read from the environment.

use std::env;
use std::time::Duration;
use tracing::warn;

use crate::orchestrator::DEFAULT_MAX_BATCH_SIZE;
use crate::IndexingError;
use spacetime_indexer_repository::IndexConfig;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry the connection until it succeeds.
    Retry,
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("retry").to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid SEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Everything the indexer needs to know about its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexerSettings {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub index_config: IndexConfig,
    pub max_batch_size: Option<usize>,
}

impl IndexerSettings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ELASTICSEARCH_HOST`: Search engine host (required)
    /// - `ELASTICSEARCH_PORT`: Search engine port (required)
    /// - `ELASTICSEARCH_SCHEME`: `http` or `https` (default: http)
    /// - `SEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `SEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `INDEX_SHARDS`: Primary shards per dataset index (default: 5)
    /// - `INDEX_REPLICAS`: Replicas per dataset index (default: 0)
    /// - `LEGACY_DOCUMENT_TYPES`: Send mapping types to the engine (default: false)
    /// - `MAX_BATCH_SIZE`: Objects per bulk request, 0 for no cap (default: 1000)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through a lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("ELASTICSEARCH_HOST")
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| IndexingError::config("ELASTICSEARCH_HOST is not set"))?;
        let port = lookup("ELASTICSEARCH_PORT")
            .ok_or_else(|| IndexingError::config("ELASTICSEARCH_PORT is not set"))?;
        let port = port.trim().parse::<u16>().map_err(|e| {
            IndexingError::config(format!("Invalid ELASTICSEARCH_PORT '{}': {}", port, e))
        })?;

        let scheme = lookup("ELASTICSEARCH_SCHEME").unwrap_or_else(|| "http".to_string());
        if scheme != "http" && scheme != "https" {
            return Err(IndexingError::config(format!(
                "Invalid ELASTICSEARCH_SCHEME '{}'",
                scheme
            )));
        }

        let connection_mode = ConnectionMode::parse(lookup("SEARCH_CONNECTION_MODE").as_deref());
        let retry_interval = lookup("SEARCH_RETRY_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);

        let defaults = IndexConfig::default();
        let shards = parse_or("INDEX_SHARDS", lookup("INDEX_SHARDS"), defaults.number_of_shards)?;
        let replicas = parse_or(
            "INDEX_REPLICAS",
            lookup("INDEX_REPLICAS"),
            defaults.number_of_replicas,
        )?;
        let legacy_document_types = lookup("LEGACY_DOCUMENT_TYPES")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let max_batch_size = parse_or(
            "MAX_BATCH_SIZE",
            lookup("MAX_BATCH_SIZE"),
            DEFAULT_MAX_BATCH_SIZE,
        )?;

        Ok(Self {
            host: host.trim().to_string(),
            port,
            scheme,
            connection_mode,
            retry_interval: Duration::from_secs(retry_interval),
            index_config: IndexConfig::new(shards, replicas)
                .with_legacy_document_types(legacy_document_types),
            max_batch_size: Some(max_batch_size).filter(|max| *max > 0),
        })
    }

    /// The engine URL, e.g. `http://localhost:9200`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    value: Option<String>,
    default: T,
) -> Result<T, IndexingError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| IndexingError::config(format!("Invalid {} '{}'", key, raw))),
        None => Ok(default),
    }
}
