//! Request and response types for search index operations.

use serde_json::{json, Map, Value};
use spacetime_indexer_shared::IndexDocument;

/// Where a bulk operation lands: index, sub-type and document id.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTarget {
    /// The index (dataset) name.
    pub index: String,
    /// The document sub-type (the object's `type`).
    pub doc_type: String,
    /// The document id.
    pub id: String,
}

impl DocumentTarget {
    pub fn new(
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            id: id.into(),
        }
    }
}

/// One unit of a bulk write request.
///
/// An upsert carries the full document; a delete carries only its target.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    Upsert {
        target: DocumentTarget,
        document: IndexDocument,
    },
    Delete {
        target: DocumentTarget,
    },
}

impl BulkOperation {
    pub fn target(&self) -> &DocumentTarget {
        match self {
            BulkOperation::Upsert { target, .. } | BulkOperation::Delete { target } => target,
        }
    }

    /// The bulk action name for this operation.
    pub fn action_name(&self) -> &'static str {
        match self {
            BulkOperation::Upsert { .. } => "index",
            BulkOperation::Delete { .. } => "delete",
        }
    }

    /// The action descriptor line, e.g. `{"index": {"_index": "ds1", "_id": "1"}}`.
    ///
    /// `_type` is only included for engines that still support mapping types.
    pub fn action_descriptor(&self, include_type: bool) -> Value {
        let target = self.target();
        let mut descriptor = Map::new();
        descriptor.insert("_index".to_string(), json!(target.index));
        if include_type {
            descriptor.insert("_type".to_string(), json!(target.doc_type));
        }
        descriptor.insert("_id".to_string(), json!(target.id));

        let mut line = Map::new();
        line.insert(self.action_name().to_string(), Value::Object(descriptor));
        Value::Object(line)
    }

    /// The bulk body lines for this operation: the descriptor, followed by
    /// the document for upserts.
    pub fn to_bulk_lines(&self, include_type: bool) -> Result<Vec<Value>, serde_json::Error> {
        let descriptor = self.action_descriptor(include_type);
        match self {
            BulkOperation::Upsert { document, .. } => Ok(vec![descriptor, document.to_json()?]),
            BulkOperation::Delete { .. } => Ok(vec![descriptor]),
        }
    }
}

/// A per-document failure reported inside an accepted bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemFailure {
    pub index: String,
    pub id: String,
    pub status: u16,
    pub reason: String,
}

/// Summary of a bulk write, including the per-item failures the engine reported.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkWriteSummary {
    /// Total number of operations sent.
    pub total: usize,
    /// Number of operations the engine applied.
    pub succeeded: usize,
    /// Number of operations the engine rejected.
    pub failed: usize,
    /// Time the engine spent on the request.
    pub took_ms: u64,
    /// Individual failures.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkWriteSummary {
    /// Summary for an empty request.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a summary from the engine's bulk response body.
    ///
    /// A missing `items` array is treated as zero items; a malformed item is
    /// counted as a failure.
    pub fn from_response(body: &Value, total: usize) -> Self {
        let took_ms = body.get("took").and_then(Value::as_u64).unwrap_or(0);
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut failures = Vec::new();
        for item in items {
            // Each item is keyed by its action name.
            let Some(result) = item.as_object().and_then(|obj| obj.values().next()) else {
                failures.push(BulkItemFailure {
                    index: String::new(),
                    id: String::new(),
                    status: 0,
                    reason: format!("malformed bulk item: {}", item),
                });
                continue;
            };

            let status = result.get("status").and_then(Value::as_u64).unwrap_or(0) as u16;
            // A delete of a missing document is reported as a 404 without an error object.
            if let Some(error) = result.get("error") {
                let reason = error
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| error.to_string());
                failures.push(BulkItemFailure {
                    index: string_field(result, "_index"),
                    id: string_field(result, "_id"),
                    status,
                    reason,
                });
            }
        }

        let failed = failures.len().min(total);
        Self {
            total,
            succeeded: total - failed,
            failed,
            took_ms,
            failures,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

fn string_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// A compiled search: the indices to search and the engine query body.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineQuery {
    /// Indices to search. Empty means all indices.
    pub indices: Vec<String>,
    /// The query body.
    pub body: Value,
}

impl EngineQuery {
    /// The index expression for the search call (`*` when unrestricted).
    pub fn index_pattern(&self) -> String {
        if self.indices.is_empty() {
            "*".to_string()
        } else {
            self.indices.join(",")
        }
    }
}

/// One step of an atomic alias update.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn to_json(&self) -> Value {
        match self {
            AliasAction::Add { index, alias } => {
                json!({ "add": { "index": index, "alias": alias } })
            }
            AliasAction::Remove { index, alias } => {
                json!({ "remove": { "index": index, "alias": alias } })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert() -> BulkOperation {
        BulkOperation::Upsert {
            target: DocumentTarget::new("ds1", "st:Place", "1"),
            document: IndexDocument::new("1", "st:Place"),
        }
    }

    #[test]
    fn test_upsert_emits_descriptor_and_document() {
        let lines = upsert().to_bulk_lines(false).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], json!({ "index": { "_index": "ds1", "_id": "1" } }));
        assert_eq!(lines[1]["id"], "1");
    }

    #[test]
    fn test_delete_emits_descriptor_only() {
        let operation = BulkOperation::Delete {
            target: DocumentTarget::new("ds1", "st:Place", "1"),
        };
        let lines = operation.to_bulk_lines(true).unwrap();
        assert_eq!(
            lines,
            vec![json!({ "delete": { "_index": "ds1", "_type": "st:Place", "_id": "1" } })]
        );
    }

    #[test]
    fn test_summary_counts_item_failures() {
        let body = json!({
            "took": 12,
            "errors": true,
            "items": [
                { "index": { "_index": "ds1", "_id": "1", "status": 201 } },
                { "index": { "_index": "ds1", "_id": "2", "status": 400,
                    "error": { "type": "mapper_parsing_exception", "reason": "bad geo_point" } } },
                { "delete": { "_index": "ds1", "_id": "3", "status": 404, "result": "not_found" } }
            ]
        });

        let summary = BulkWriteSummary::from_response(&body, 3);

        assert_eq!(summary.took_ms, 12);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].id, "2");
        assert_eq!(summary.failures[0].status, 400);
        assert_eq!(summary.failures[0].reason, "bad geo_point");
    }

    #[test]
    fn test_summary_without_items() {
        let summary = BulkWriteSummary::from_response(&json!({}), 0);
        assert_eq!(summary, BulkWriteSummary::empty());
    }

    #[test]
    fn test_index_pattern() {
        let query = EngineQuery {
            indices: vec![],
            body: json!({}),
        };
        assert_eq!(query.index_pattern(), "*");

        let query = EngineQuery {
            indices: vec!["ds1".to_string(), "ds2".to_string()],
            body: json!({}),
        };
        assert_eq!(query.index_pattern(), "ds1,ds2");
    }
}
