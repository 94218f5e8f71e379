//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search engine calls,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{AliasAction, BulkOperation, BulkWriteSummary, EngineQuery};

/// Abstracts the underlying search engine (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the indexing pipeline and into
/// `SearchIndexService`, which makes it easy to test both with mock engines.
/// The pipeline never issues two calls at once, so a single provider
/// instance is shared across all of its calls.
///
/// All methods return `Result<T, SearchIndexError>`. Implementations must map
/// engine responses onto the lifecycle variants: an index that already exists
/// is `IndexAlreadyExists`, a missing index is `IndexNotFound`, and an
/// unreachable engine is `ConnectionError`.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Create an index with the given settings and mapping document.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was created
    /// * `Err(SearchIndexError::IndexAlreadyExists)` - If the index exists already
    /// * `Err(SearchIndexError)` - If creation fails for any other reason
    async fn create_index(&self, index: &str, mapping: &Value) -> Result<(), SearchIndexError>;

    /// Delete an index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was deleted
    /// * `Err(SearchIndexError::IndexNotFound)` - If the index does not exist
    /// * `Err(SearchIndexError)` - If the deletion fails for any other reason
    async fn delete_index(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Send operations to the engine as a single bulk request.
    ///
    /// Per-document failures inside an accepted request are reported in the
    /// summary, not as an error.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkWriteSummary)` - Aggregate counts and per-item failures
    /// * `Err(SearchIndexError)` - If the bulk request fails entirely
    async fn bulk_write(
        &self,
        operations: &[BulkOperation],
    ) -> Result<BulkWriteSummary, SearchIndexError>;

    /// Execute a compiled search and return the raw engine response.
    async fn search(&self, query: &EngineQuery) -> Result<Value, SearchIndexError>;

    /// Apply alias actions atomically.
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError>;

    /// Point an alias at an index.
    async fn put_alias(&self, index: &str, alias: &str) -> Result<(), SearchIndexError>;

    /// Return the index currently behind an alias.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The first index the alias points at
    /// * `Err(SearchIndexError::IndexNotFound)` - If the alias does not exist
    async fn get_aliased_index(&self, alias: &str) -> Result<String, SearchIndexError>;
}
