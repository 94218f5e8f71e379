//! Search result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single search hit: the stored document plus the dataset it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRecord {
    /// Name of the index the hit was found in.
    pub dataset: String,

    /// The stored document fields.
    #[serde(flatten)]
    pub document: Map<String, Value>,
}

impl SearchRecord {
    /// Create a record, dropping any stored `dataset` field from the document
    /// so the originating index always wins.
    pub fn new(dataset: impl Into<String>, mut document: Map<String, Value>) -> Self {
        document.remove("dataset");
        Self {
            dataset: dataset.into(),
            document,
        }
    }

    /// Look up a stored field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.document.get(field)
    }

    /// The stored document id, if present.
    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dataset_overrides_stored_field() {
        let document = json!({ "id": "1", "dataset": "stale", "name": "Broadway" });
        let record = SearchRecord::new("ds1", document.as_object().unwrap().clone());

        assert_eq!(record.dataset, "ds1");
        assert_eq!(record.id(), Some("1"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({ "dataset": "ds1", "id": "1", "name": "Broadway" }));
    }
}
