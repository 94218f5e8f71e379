//! Configuration types for the SearchIndexService.

use crate::query::PAGE_SIZE;

/// Configuration for the SearchIndexService.
#[derive(Debug, Clone)]
pub struct SearchIndexServiceConfig {
    /// Number of hits returned per search request.
    ///
    /// Defaults to 100. Callers page through larger result sets with
    /// `SearchParams::offset`.
    pub page_size: usize,
}

impl Default for SearchIndexServiceConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
        }
    }
}

impl SearchIndexServiceConfig {
    /// Create a config with a custom page size.
    ///
    /// # Arguments
    ///
    /// * `page_size` - Number of hits returned per search request
    pub fn with_page_size(page_size: usize) -> Self {
        Self { page_size }
    }
}
