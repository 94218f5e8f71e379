//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend, plus the dataset index mappings.

mod index_config;
mod provider;

pub use index_config::{extension_properties, ContextFieldType, IndexConfig};
pub use provider::OpenSearchProvider;
