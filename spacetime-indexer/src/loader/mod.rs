//! Loader module for the indexer.
//!
//! Writes translated operations to the search engine and manages the
//! lifecycle of dataset indices.

mod index_lifecycle;

pub use index_lifecycle::{IndexLifecycleManager, LifecycleOutcome};

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::IngestError;
use spacetime_indexer_repository::{BulkOperation, BulkWriteSummary, SearchIndexProvider};

/// Loader that writes bulk operations into the search engine.
///
/// Each call sends exactly one bulk request. Items the engine rejects are
/// logged and reported in the summary; only a failure of the request itself
/// is returned as an error.
pub struct SearchLoader {
    provider: Arc<dyn SearchIndexProvider>,
}

impl SearchLoader {
    /// Create a new search loader with the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self { provider }
    }

    /// Write one batch of operations.
    ///
    /// An empty batch is not sent.
    #[instrument(skip(self, operations), fields(operation_count = operations.len()))]
    pub async fn write(
        &self,
        operations: &[BulkOperation],
    ) -> Result<BulkWriteSummary, IngestError> {
        if operations.is_empty() {
            debug!("No operations to write");
            return Ok(BulkWriteSummary::empty());
        }

        let summary = match self.provider.bulk_write(operations).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, count = operations.len(), "Failed to write batch");
                return Err(e.into());
            }
        };

        if summary.has_failures() {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                took_ms = summary.took_ms,
                "Bulk write completed with some failures"
            );
            for failure in &summary.failures {
                error!(
                    index = %failure.index,
                    object_id = %failure.id,
                    status = failure.status,
                    reason = %failure.reason,
                    "Failed to write document"
                );
            }
        } else {
            info!(
                indexed = summary.succeeded,
                took_ms = summary.took_ms,
                "Indexed batch"
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use spacetime_indexer_repository::{
        AliasAction, BulkItemFailure, DocumentTarget, EngineQuery, SearchIndexError,
    };
    use std::sync::Mutex;

    /// Mock search provider for testing.
    struct MockSearchProvider {
        writes: Mutex<Vec<Vec<BulkOperation>>>,
        reject_ids: Vec<String>,
        fail_request: bool,
    }

    impl MockSearchProvider {
        fn new() -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                reject_ids: Vec::new(),
                fail_request: false,
            }
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockSearchProvider {
        async fn create_index(
            &self,
            _index: &str,
            _mapping: &Value,
        ) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn delete_index(&self, _index: &str) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn bulk_write(
            &self,
            operations: &[BulkOperation],
        ) -> Result<BulkWriteSummary, SearchIndexError> {
            if self.fail_request {
                return Err(SearchIndexError::connection("connection refused"));
            }
            self.writes.lock().unwrap().push(operations.to_vec());

            let failures: Vec<BulkItemFailure> = operations
                .iter()
                .filter(|op| self.reject_ids.contains(&op.target().id))
                .map(|op| BulkItemFailure {
                    index: op.target().index.clone(),
                    id: op.target().id.clone(),
                    status: 400,
                    reason: "mapper_parsing_exception".to_string(),
                })
                .collect();

            Ok(BulkWriteSummary {
                total: operations.len(),
                succeeded: operations.len() - failures.len(),
                failed: failures.len(),
                took_ms: 3,
                failures,
            })
        }

        async fn search(&self, _query: &EngineQuery) -> Result<Value, SearchIndexError> {
            Ok(Value::Null)
        }

        async fn update_aliases(&self, _actions: &[AliasAction]) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn put_alias(&self, _index: &str, _alias: &str) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn get_aliased_index(&self, alias: &str) -> Result<String, SearchIndexError> {
            Err(SearchIndexError::index_not_found(alias))
        }
    }

    fn delete(id: &str) -> BulkOperation {
        BulkOperation::Delete {
            target: DocumentTarget::new("ds1", "t", id),
        }
    }

    #[tokio::test]
    async fn test_write_sends_one_request() {
        let provider = Arc::new(MockSearchProvider::new());
        let loader = SearchLoader::new(provider.clone());

        let summary = loader.write(&[delete("1"), delete("2")]).await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(provider.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_sent() {
        let provider = Arc::new(MockSearchProvider::new());
        let loader = SearchLoader::new(provider.clone());

        let summary = loader.write(&[]).await.unwrap();

        assert_eq!(summary, BulkWriteSummary::empty());
        assert!(provider.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_item_failures_are_reported_not_raised() {
        let provider = Arc::new(MockSearchProvider {
            reject_ids: vec!["2".to_string()],
            ..MockSearchProvider::new()
        });
        let loader = SearchLoader::new(provider);

        let summary = loader.write(&[delete("1"), delete("2")]).await.unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].id, "2");
    }

    #[tokio::test]
    async fn test_request_failure_is_an_error() {
        let provider = Arc::new(MockSearchProvider {
            fail_request: true,
            ..MockSearchProvider::new()
        });
        let loader = SearchLoader::new(provider);

        let result = loader.write(&[delete("1")]).await;
        assert!(matches!(
            result,
            Err(IngestError::SearchIndex(SearchIndexError::ConnectionError(_)))
        ));
    }
}
