//! Creation and deletion of dataset indices.

use std::sync::Arc;

use serde_json::Value;
use spacetime_indexer_repository::{
    validate_index_name, IndexConfig, SearchIndexError, SearchIndexProvider,
};
use spacetime_indexer_shared::{Action, DatasetMessage, DatasetPayload};
use tracing::{debug, info, instrument};

use crate::errors::IngestError;

/// What a dataset message did to its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    Created,
    /// The index was already there; nothing changed.
    AlreadyExists,
    Deleted,
    /// The message has no effect on the index.
    Skipped,
}

/// Keeps one index per dataset.
pub struct IndexLifecycleManager {
    provider: Arc<dyn SearchIndexProvider>,
    index_config: IndexConfig,
}

impl IndexLifecycleManager {
    pub fn new(provider: Arc<dyn SearchIndexProvider>, index_config: IndexConfig) -> Self {
        Self {
            provider,
            index_config,
        }
    }

    /// The mapping for a dataset's index: the base mapping, plus the fields
    /// declared by its JSON-LD context.
    pub fn mapping_for(&self, payload: &DatasetPayload) -> Value {
        self.index_config
            .mapping_for_dataset(payload.jsonld_context.as_ref())
    }

    /// Create the index for a dataset.
    ///
    /// An index that already exists is left untouched and reported as
    /// [`LifecycleOutcome::AlreadyExists`].
    #[instrument(skip(self, mapping))]
    pub async fn create(
        &self,
        dataset_id: &str,
        mapping: &Value,
    ) -> Result<LifecycleOutcome, IngestError> {
        validate_index_name(dataset_id)?;

        match self.provider.create_index(dataset_id, mapping).await {
            Ok(()) => {
                info!(dataset = %dataset_id, "Created dataset index");
                Ok(LifecycleOutcome::Created)
            }
            Err(SearchIndexError::IndexAlreadyExists(_)) => {
                debug!(dataset = %dataset_id, "Dataset index already exists");
                Ok(LifecycleOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the index of a dataset, with every document in it.
    ///
    /// Deleting an index that does not exist is an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, dataset_id: &str) -> Result<LifecycleOutcome, IngestError> {
        validate_index_name(dataset_id)?;
        self.provider.delete_index(dataset_id).await?;

        info!(dataset = %dataset_id, "Deleted dataset index");
        Ok(LifecycleOutcome::Deleted)
    }

    /// Apply a dataset message.
    pub async fn apply(&self, message: &DatasetMessage) -> Result<LifecycleOutcome, IngestError> {
        let dataset_id = message.payload.id.as_str();
        match message.action {
            Action::Create => {
                let mapping = self.mapping_for(&message.payload);
                self.create(dataset_id, &mapping).await
            }
            Action::Delete => self.delete(dataset_id).await,
            Action::Update => {
                debug!(dataset = %dataset_id, "Ignoring dataset update");
                Ok(LifecycleOutcome::Skipped)
            }
        }
    }
}
