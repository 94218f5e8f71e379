//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesGetAliasParts, IndicesPutAliasParts},
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::IndexConfig;
use crate::types::{AliasAction, BulkOperation, BulkWriteSummary, EngineQuery};
use crate::utils;

/// OpenSearch provider implementation.
///
/// Wraps a single client connection to the engine. The connection is reused
/// for every call.
///
/// # Example
///
/// ```ignore
/// use spacetime_indexer_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// provider.check_connection().await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider for the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - Settings shared by all dataset indices
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            shards = index_config.number_of_shards,
            replicas = index_config.number_of_replicas,
            legacy_document_types = index_config.legacy_document_types,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// The index configuration this provider was created with.
    pub fn index_config(&self) -> &IndexConfig {
        &self.index_config
    }

    /// Ping the engine.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the engine answered
    /// * `Err(SearchIndexError::ConnectionError)` - If it could not be reached
    pub async fn check_connection(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }

    /// Serialize operations into bulk body lines.
    fn bulk_body(
        &self,
        operations: &[BulkOperation],
    ) -> Result<Vec<JsonBody<Value>>, SearchIndexError> {
        let include_type = self.index_config.legacy_document_types;
        let mut body = Vec::with_capacity(operations.len() * 2);
        for operation in operations {
            for line in operation.to_bulk_lines(include_type)? {
                body.push(JsonBody::new(line));
            }
        }
        Ok(body)
    }

    /// Read the status and body of a failed response.
    async fn failure_parts(response: Response) -> (u16, String) {
        let status = response.status_code().as_u16();
        let body = response.text().await.unwrap_or_default();
        (status, body)
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn create_index(&self, index: &str, mapping: &Value) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(mapping.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_parts(response).await;
            let err = utils::classify_create_failure(index, status, &body);
            if !matches!(err, SearchIndexError::IndexAlreadyExists(_)) {
                error!(
                    index = %index,
                    status = status,
                    body = %body,
                    "Create index request failed"
                );
            }
            return Err(err);
        }

        debug!(index = %index, "Index created");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_parts(response).await;
            error!(index = %index, status = status, body = %body, "Delete index request failed");
            return Err(utils::classify_delete_failure(index, status, &body));
        }

        debug!(index = %index, "Index deleted");
        Ok(())
    }

    async fn bulk_write(
        &self,
        operations: &[BulkOperation],
    ) -> Result<BulkWriteSummary, SearchIndexError> {
        if operations.is_empty() {
            return Ok(BulkWriteSummary::empty());
        }

        let body = self.bulk_body(operations)?;

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_parts(response).await;
            error!(status = status, body = %body, "Bulk request failed");
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, body
            )));
        }

        let response_body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(BulkWriteSummary::from_response(
            &response_body,
            operations.len(),
        ))
    }

    async fn search(&self, query: &EngineQuery) -> Result<Value, SearchIndexError> {
        let index_pattern = query.index_pattern();
        let indices: Vec<&str> = if query.indices.is_empty() {
            vec!["*"]
        } else {
            query.indices.iter().map(String::as_str).collect()
        };

        let response = self
            .client
            .search(SearchParts::Index(&indices))
            .body(query.body.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_parts(response).await;
            error!(index = %index_pattern, status = status, body = %body, "Search request failed");
            return Err(utils::classify_search_failure(&index_pattern, status, &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
        let actions: Vec<Value> = actions.iter().map(AliasAction::to_json).collect();

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_parts(response).await;
            error!(status = status, body = %body, "Update aliases request failed");
            return Err(SearchIndexError::alias(format!(
                "Update aliases failed with status {}: {}",
                status, body
            )));
        }

        debug!(action_count = actions.len(), "Aliases updated");
        Ok(())
    }

    async fn put_alias(&self, index: &str, alias: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .put_alias(IndicesPutAliasParts::IndexName(&[index], alias))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_parts(response).await;
            error!(
                index = %index,
                alias = %alias,
                status = status,
                body = %body,
                "Put alias request failed"
            );
            if status == 404 {
                return Err(SearchIndexError::index_not_found(index));
            }
            return Err(SearchIndexError::alias(format!(
                "Put alias '{}' on '{}' failed with status {}: {}",
                alias, index, status, body
            )));
        }

        debug!(index = %index, alias = %alias, "Alias created");
        Ok(())
    }

    async fn get_aliased_index(&self, alias: &str) -> Result<String, SearchIndexError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_parts(response).await;
            if status == 404 {
                return Err(SearchIndexError::index_not_found(alias));
            }
            return Err(SearchIndexError::alias(format!(
                "Get alias '{}' failed with status {}: {}",
                alias, status, body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        first_index_name(&body).ok_or_else(|| SearchIndexError::index_not_found(alias))
    }
}

/// The first index in a get-alias response (`{"<index>": {"aliases": {...}}}`).
fn first_index_name(body: &Value) -> Option<String> {
    body.as_object()?.keys().next().cloned()
}
