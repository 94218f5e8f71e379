//! Core data structures shared across the indexer and search crates.

pub mod index_document;
pub mod message;
pub mod search_params;
pub mod search_result;

pub use index_document::IndexDocument;
pub use message::{Action, DatasetMessage, DatasetPayload, Message, ObjectMessage, ObjectPayload};
pub use search_params::{BoundingBox, SearchParams};
pub use search_result::SearchRecord;
