//! # Spacetime Indexer
//!
//! Keeps one search index per dataset in sync with an ordered stream of
//! dataset and object messages.
//!
//! ## Architecture
//!
//! The indexer follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Reads messages and groups them into ordered units
//! 2. **Processor**: Translates object messages into bulk operations
//! 3. **Loader**: Writes operations and creates/deletes dataset indices
//! 4. **Orchestrator**: Executes units one at a time, in order
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: NDJSON message reader and batcher
//! - [`processor`]: Geometry and date derivation, operation translation
//! - [`loader`]: Bulk writes and index lifecycle
//! - [`orchestrator`]: Sequential pipeline execution
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod consumer;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;

pub use config::{Dependencies, IndexerSettings};
pub use errors::IngestError;
pub use orchestrator::{Orchestrator, PipelineReport};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
