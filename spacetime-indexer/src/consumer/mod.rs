//! Consumer module for the indexer.
//!
//! Reads message envelopes from newline-delimited JSON on a reader thread and
//! groups them into ordered pipeline units.

mod batcher;
mod message_reader;

pub use batcher::{MessageBatcher, PipelineUnit};
pub use message_reader::{MessageReader, DEFAULT_READ_AHEAD};
