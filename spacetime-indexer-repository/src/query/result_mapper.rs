//! Maps raw engine search responses to [`SearchRecord`]s.

use serde_json::{Map, Value};
use spacetime_indexer_shared::SearchRecord;

use crate::errors::SearchIndexError;

/// Convert the hits of a search response into records.
///
/// Each record is the stored `_source` plus a `dataset` field naming the
/// index the hit came from. Score, id and the other envelope fields are
/// dropped. Hit order is preserved.
pub fn map_hits(response: &Value) -> Result<Vec<SearchRecord>, SearchIndexError> {
    let hits = response
        .get("hits")
        .and_then(|hits| hits.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("Search response has no hits array"))?;

    hits.iter().map(map_hit).collect()
}

fn map_hit(hit: &Value) -> Result<SearchRecord, SearchIndexError> {
    let index = hit
        .get("_index")
        .and_then(Value::as_str)
        .ok_or_else(|| SearchIndexError::parse("Search hit has no _index"))?;

    let document = match hit.get("_source") {
        Some(Value::Object(source)) => source.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            return Err(SearchIndexError::parse(format!(
                "Search hit in '{}' has a non-object _source: {}",
                index, other
            )))
        }
    };

    Ok(SearchRecord::new(index, document))
}
