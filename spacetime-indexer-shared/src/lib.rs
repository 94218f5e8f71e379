//! # Space/Time Indexer Shared
//!
//! This crate defines the data structures passed between the indexing pipeline
//! and the search side: the lifecycle messages consumed by the indexer, the
//! translated documents written into the index, and the search parameters and
//! records exchanged with read callers.

pub mod types;

pub use types::index_document::IndexDocument;
pub use types::message::{
    Action, DatasetMessage, DatasetPayload, Message, MessageMeta, ObjectMessage, ObjectPayload,
};
pub use types::search_params::{BoundingBox, SearchParams};
pub use types::search_result::SearchRecord;
