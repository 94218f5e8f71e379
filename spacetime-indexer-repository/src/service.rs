//! Search index service implementation.
//!
//! This module provides the read-side entry point: structured searches across
//! dataset indices, plus the alias operations used for zero-downtime
//! reindexing.

use std::sync::Arc;

use spacetime_indexer_shared::{SearchParams, SearchRecord};
use tracing::{debug, info, instrument};

use crate::config::SearchIndexServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::query::{map_hits, QueryBuilder};
use crate::types::{AliasAction, EngineQuery};
use crate::utils::validate_index_name;

/// The main service for searching the index.
///
/// It validates search parameters, compiles them with the `QueryBuilder`,
/// delegates execution to a `SearchIndexProvider`, and maps hits to
/// `SearchRecord`s. Engine errors are returned unmodified.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use spacetime_indexer_repository::{IndexConfig, OpenSearchProvider, SearchIndexService};
/// use spacetime_indexer_shared::{BoundingBox, SearchParams};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// let service = SearchIndexService::new(Arc::new(provider));
///
/// let params = SearchParams::new()
///     .with_name("broadway")
///     .with_contains(BoundingBox::from_corners([-74.02, 40.70], [-73.93, 40.88]));
///
/// for record in service.search(&params).await? {
///     println!("{} {:?}", record.dataset, record.id());
/// }
/// # Ok(())
/// # }
/// ```
pub struct SearchIndexService {
    provider: Arc<dyn SearchIndexProvider>,
    query_builder: QueryBuilder,
}

impl SearchIndexService {
    /// Create a new SearchIndexService with default configuration.
    ///
    /// # Arguments
    ///
    /// * `provider` - A shared implementation of `SearchIndexProvider` (e.g., `OpenSearchProvider`)
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self::with_config(provider, SearchIndexServiceConfig::default())
    }

    /// Create a new SearchIndexService with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `provider` - A shared implementation of `SearchIndexProvider`
    /// * `config` - Custom configuration for the service
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self {
            provider,
            query_builder: QueryBuilder::with_page_size(config.page_size),
        }
    }

    /// Validate and compile search parameters without executing them.
    ///
    /// # Returns
    ///
    /// * `Ok(EngineQuery)` - The compiled query
    /// * `Err(SearchIndexError::ValidationError)` - If the parameters are invalid
    pub fn compile(&self, params: &SearchParams) -> Result<EngineQuery, SearchIndexError> {
        params.validate().map_err(SearchIndexError::validation)?;

        if let Some(datasets) = params.dataset_filter() {
            for dataset in datasets {
                validate_index_name(dataset)?;
            }
        }

        Ok(self.query_builder.build(params))
    }

    /// Search the index.
    ///
    /// # Arguments
    ///
    /// * `params` - The structured search request
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SearchRecord>)` - At most one page of hits, in engine order
    /// * `Err(SearchIndexError::ValidationError)` - If the parameters are invalid
    /// * `Err(SearchIndexError)` - The engine's error, unmodified
    #[instrument(skip(self, params))]
    pub async fn search(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<SearchRecord>, SearchIndexError> {
        let query = self.compile(params)?;
        let response = self.provider.search(&query).await?;
        let records = map_hits(&response)?;

        debug!(
            index = %query.index_pattern(),
            hit_count = records.len(),
            "Search completed"
        );
        Ok(records)
    }

    /// Atomically move an alias from one index to another.
    ///
    /// The removal and the addition are sent as a single request, so readers
    /// of the alias never see it unset.
    pub async fn swap_alias(
        &self,
        old_index: &str,
        new_index: &str,
        alias: &str,
    ) -> Result<(), SearchIndexError> {
        validate_index_name(new_index)?;

        self.provider
            .update_aliases(&[
                AliasAction::Remove {
                    index: old_index.to_string(),
                    alias: alias.to_string(),
                },
                AliasAction::Add {
                    index: new_index.to_string(),
                    alias: alias.to_string(),
                },
            ])
            .await?;

        info!(alias = %alias, old_index = %old_index, new_index = %new_index, "Alias swapped");
        Ok(())
    }

    /// Point an alias at an index (initial setup).
    pub async fn point_alias(&self, index: &str, alias: &str) -> Result<(), SearchIndexError> {
        validate_index_name(index)?;
        self.provider.put_alias(index, alias).await
    }

    /// The index currently behind an alias.
    pub async fn aliased_index(&self, alias: &str) -> Result<String, SearchIndexError> {
        self.provider.get_aliased_index(alias).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BulkOperation, BulkWriteSummary};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use spacetime_indexer_shared::BoundingBox;
    use std::sync::Mutex;

    /// Mock provider for testing
    struct MockProvider {
        searches: Mutex<Vec<EngineQuery>>,
        alias_actions: Mutex<Vec<AliasAction>>,
        search_error: Option<SearchIndexError>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                searches: Mutex::new(Vec::new()),
                alias_actions: Mutex::new(Vec::new()),
                search_error: None,
            }
        }

        fn failing(error: SearchIndexError) -> Self {
            Self {
                search_error: Some(error),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockProvider {
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
            _operations: &[BulkOperation],
        ) -> Result<BulkWriteSummary, SearchIndexError> {
            Ok(BulkWriteSummary::empty())
        }

        async fn search(&self, query: &EngineQuery) -> Result<Value, SearchIndexError> {
            if let Some(err) = &self.search_error {
                return Err(err.clone());
            }
            self.searches.lock().unwrap().push(query.clone());
            Ok(json!({
                "hits": {
                    "hits": [
                        {
                            "_index": "ds1",
                            "_id": "1",
                            "_score": 2.0,
                            "_source": { "id": "1", "name": "Broadway" }
                        }
                    ]
                }
            }))
        }

        async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
            self.alias_actions.lock().unwrap().extend_from_slice(actions);
            Ok(())
        }

        async fn put_alias(&self, index: &str, alias: &str) -> Result<(), SearchIndexError> {
            self.alias_actions.lock().unwrap().push(AliasAction::Add {
                index: index.to_string(),
                alias: alias.to_string(),
            });
            Ok(())
        }

        async fn get_aliased_index(&self, alias: &str) -> Result<String, SearchIndexError> {
            Ok(format!("{}_v1", alias))
        }
    }

    #[tokio::test]
    async fn test_search_maps_records() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::new(provider.clone());

        let params = SearchParams::new()
            .with_datasets(["ds1"])
            .with_contains(BoundingBox::from_corners([0.0, 0.0], [2.0, 2.0]));
        let records = service.search(&params).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].dataset, "ds1");
        assert_eq!(records[0].get("name"), Some(&json!("Broadway")));

        let searches = provider.searches.lock().unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].indices, vec!["ds1".to_string()]);
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_params() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::new(provider.clone());

        let params =
            SearchParams::new().with_geometry(BoundingBox::from_corners([0.0, 0.0], [0.0, 120.0]));
        let result = service.search(&params).await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));

        let params = SearchParams::new().with_datasets(["Bad Name"]);
        let result = service.search(&params).await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));

        assert!(provider.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_returns_engine_error_unmodified() {
        let error = SearchIndexError::search("query_shard_exception");
        let service = SearchIndexService::new(Arc::new(MockProvider::failing(error.clone())));

        let result = service.search(&SearchParams::new().with_name("x")).await;
        assert_eq!(result.unwrap_err(), error);
    }

    #[tokio::test]
    async fn test_page_size_from_config() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::with_config(
            provider.clone(),
            SearchIndexServiceConfig::with_page_size(10),
        );

        service.search(&SearchParams::new()).await.unwrap();
        assert_eq!(provider.searches.lock().unwrap()[0].body["size"], 10);
    }

    #[tokio::test]
    async fn test_swap_alias_sends_remove_then_add() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::new(provider.clone());

        service.swap_alias("ds1_v1", "ds1_v2", "ds1").await.unwrap();

        let actions = provider.alias_actions.lock().unwrap();
        assert_eq!(
            *actions,
            vec![
                AliasAction::Remove {
                    index: "ds1_v1".to_string(),
                    alias: "ds1".to_string()
                },
                AliasAction::Add {
                    index: "ds1_v2".to_string(),
                    alias: "ds1".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_point_and_lookup_alias() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::new(provider.clone());

        service.point_alias("ds1_v1", "ds1").await.unwrap();
        assert_eq!(provider.alias_actions.lock().unwrap().len(), 1);
        assert_eq!(service.aliased_index("ds1").await.unwrap(), "ds1_v1");
    }
}
