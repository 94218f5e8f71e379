//! Error types for the indexing pipeline.

use spacetime_indexer_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur while indexing.
///
/// `MalformedGeometry`, `DateResolution` and `InvalidObject` are local to one
/// record: the record is left out of its batch and the run continues. Every
/// other variant ends the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Geometry derivation failed for one object.
    #[error("Malformed geometry for object '{id}': {reason}")]
    MalformedGeometry { id: String, reason: String },

    /// A validity date could not be resolved for one object.
    #[error("Date resolution failed for object '{id}': {reason}")]
    DateResolution { id: String, reason: String },

    /// An object cannot be written as given.
    #[error("Invalid object '{id}': {reason}")]
    InvalidObject { id: String, reason: String },

    /// Reading the message input failed.
    #[error("Consumer error: {0}")]
    ConsumerError(String),

    /// Error from the search engine.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),
}

impl IngestError {
    /// Create a malformed geometry error.
    pub fn malformed_geometry(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedGeometry {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a date resolution error.
    pub fn date_resolution(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DateResolution {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid object error.
    pub fn invalid_object(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidObject {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a consumer error.
    pub fn consumer(msg: impl Into<String>) -> Self {
        Self::ConsumerError(msg.into())
    }

    /// Whether the error only affects a single record.
    pub fn is_record_local(&self) -> bool {
        matches!(
            self,
            Self::MalformedGeometry { .. }
                | Self::DateResolution { .. }
                | Self::InvalidObject { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_local_classification() {
        assert!(IngestError::malformed_geometry("1", "no coordinates").is_record_local());
        assert!(IngestError::date_resolution("1", "bad date").is_record_local());
        assert!(IngestError::invalid_object("", "empty id").is_record_local());
        assert!(!IngestError::consumer("broken pipe").is_record_local());
        assert!(!IngestError::from(SearchIndexError::connection("refused")).is_record_local());
    }
}
