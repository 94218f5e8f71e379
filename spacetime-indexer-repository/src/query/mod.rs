//! Query compilation and result mapping for the read path.

mod query_builder;
mod result_mapper;

pub use query_builder::{QueryBuilder, PAGE_SIZE};
pub use result_mapper::map_hits;
