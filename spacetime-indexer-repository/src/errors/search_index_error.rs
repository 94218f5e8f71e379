//! Search index error types.
//!
//! This module defines the unified error type for all search engine calls,
//! including transport failures, engine-reported failures and request
//! validation errors.

use thiserror::Error;

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait and `SearchIndexService`. Engine
/// responses are classified into the lifecycle variants
/// (`IndexAlreadyExists`, `IndexNotFound`) so callers can decide which
/// failures to tolerate.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchIndexError {
    /// Validation error (e.g., invalid index names, out-of-range coordinates).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The engine could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The index to create already exists.
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// The index (or alias) does not exist.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Failed to create an index for another reason.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to delete an index for another reason.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// The bulk request as a whole was rejected.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// The engine rejected a search request.
    #[error("Search error: {0}")]
    SearchError(String),

    /// An alias operation failed.
    #[error("Alias error: {0}")]
    AliasError(String),

    /// Failed to parse response from the engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index-already-exists error.
    pub fn index_already_exists(index: impl Into<String>) -> Self {
        Self::IndexAlreadyExists(index.into())
    }

    /// Create an index-not-found error.
    pub fn index_not_found(index: impl Into<String>) -> Self {
        Self::IndexNotFound(index.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create a search error.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::SearchError(msg.into())
    }

    /// Create an alias error.
    pub fn alias(msg: impl Into<String>) -> Self {
        Self::AliasError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

impl From<serde_json::Error> for SearchIndexError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
