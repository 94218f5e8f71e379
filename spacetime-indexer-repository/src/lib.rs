//! # Space/Time Indexer Repository
//!
//! This crate provides the seam between the indexer and the search engine:
//! the `SearchIndexProvider` trait and its OpenSearch implementation, the
//! per-dataset index mappings, the search query compiler and result mapper,
//! and the read-side `SearchIndexService`.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod query;
pub mod service;
pub mod types;
pub mod utils;

pub use config::SearchIndexServiceConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::{IndexConfig, OpenSearchProvider};
pub use query::{map_hits, QueryBuilder, PAGE_SIZE};
pub use service::SearchIndexService;
pub use types::{
    AliasAction, BulkItemFailure, BulkOperation, BulkWriteSummary, DocumentTarget, EngineQuery,
};
pub use utils::validate_index_name;
