//! Index settings and mappings for dataset indices.
//!
//! Every dataset gets its own index. All indices share the base mapping;
//! datasets that declare a JSON-LD context additionally get a nested `data`
//! sub-document with one mapped field per recognized context entry.

use serde_json::{json, Map, Value};

/// Full IRI prefix of the XML Schema datatypes.
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// Name of the mapping type used when legacy document types are enabled.
const LEGACY_DEFAULT_TYPE: &str = "_default_";

/// Configuration shared by every dataset index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    /// Number of primary shards per index.
    pub number_of_shards: u32,
    /// Number of replicas per index.
    pub number_of_replicas: u32,
    /// Send `_type` in bulk descriptors and wrap mappings in `_default_`.
    ///
    /// Only engines that still support mapping types accept this.
    pub legacy_document_types: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            number_of_shards: 5,
            number_of_replicas: 0,
            legacy_document_types: false,
        }
    }
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `number_of_shards` - Primary shards per index
    /// * `number_of_replicas` - Replicas per index
    pub fn new(number_of_shards: u32, number_of_replicas: u32) -> Self {
        Self {
            number_of_shards,
            number_of_replicas,
            ..Self::default()
        }
    }

    /// Enable or disable legacy document types.
    pub fn with_legacy_document_types(mut self, enabled: bool) -> Self {
        self.legacy_document_types = enabled;
        self
    }

    /// The mapping document for a new dataset index.
    ///
    /// # Arguments
    ///
    /// * `context` - The dataset's JSON-LD context, if it declared one
    pub fn mapping_for_dataset(&self, context: Option<&Map<String, Value>>) -> Value {
        let mut properties = base_properties();

        if let Some(context) = context {
            properties.insert(
                "data".to_string(),
                json!({
                    "type": "nested",
                    "include_in_parent": true,
                    "properties": extension_properties(context)
                }),
            );
        }

        let type_mapping = json!({
            "dynamic": false,
            "properties": properties
        });

        let mappings = if self.legacy_document_types {
            let mut typed = Map::new();
            typed.insert(LEGACY_DEFAULT_TYPE.to_string(), type_mapping);
            Value::Object(typed)
        } else {
            type_mapping
        };

        json!({
            "settings": self.settings(),
            "mappings": mappings
        })
    }

    fn settings(&self) -> Value {
        json!({
            "number_of_shards": self.number_of_shards,
            "number_of_replicas": self.number_of_replicas,
            "analysis": {
                "analyzer": {
                    "lowercase": {
                        "type": "custom",
                        "tokenizer": "keyword",
                        "filter": ["lowercase"]
                    }
                }
            }
        })
    }
}

/// Scalar kinds a dataset may declare for its extension fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFieldType {
    String,
    Boolean,
    Date,
    Integer,
    Double,
}

impl ContextFieldType {
    /// Recognize a declared `@type` such as `xsd:string`.
    ///
    /// The `xsd:` prefix, the full XML Schema IRI and the bare name are all
    /// accepted. Anything else is unrecognized.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let name = declared
            .strip_prefix("xsd:")
            .or_else(|| declared.strip_prefix(XSD_NAMESPACE))
            .unwrap_or(declared);

        match name {
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "integer" => Some(Self::Integer),
            "double" => Some(Self::Double),
            _ => None,
        }
    }

    /// The field mapping for this kind.
    pub fn to_mapping(self) -> Value {
        match self {
            Self::String => json!({ "type": "text" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Date => json!({ "type": "date", "format": "date_optional_time" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Double => json!({ "type": "double" }),
        }
    }
}

/// Map the typed entries of a JSON-LD context to field mappings.
///
/// Entries without an `@type`, or with an unrecognized one, are dropped.
pub fn extension_properties(context: &Map<String, Value>) -> Map<String, Value> {
    context
        .iter()
        .filter_map(|(field, definition)| {
            let declared = definition.get("@type")?.as_str()?;
            let kind = ContextFieldType::from_declared(declared)?;
            Some((field.clone(), kind.to_mapping()))
        })
        .collect()
}

fn base_properties() -> Map<String, Value> {
    let properties = json!({
        "northWest": { "type": "geo_point" },
        "southEast": { "type": "geo_point" },
        "uri": { "type": "keyword" },
        "id": { "type": "keyword", "store": true },
        "type": { "type": "keyword" },
        "name": {
            "type": "text",
            "fields": {
                "analyzed": { "type": "text", "store": true },
                "exact": { "type": "text", "analyzer": "lowercase", "store": true }
            }
        },
        "dataset": { "type": "keyword" },
        "validSince": { "type": "date", "format": "date_optional_time" },
        "validUntil": { "type": "date", "format": "date_optional_time" }
    });

    match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
