//! Lifecycle message types.
//!
//! Messages arrive as JSON envelopes of the form
//! `{ "type": ..., "action": ..., "payload": ..., "meta": ... }`. Only the
//! `object` and `dataset` types are relevant to the search index; anything
//! else is dropped while parsing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The action carried by a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

/// Metadata attached to an object message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageMeta {
    /// The dataset (and therefore the index) owning the object.
    pub dataset: String,
}

/// Payload of an object message.
///
/// Fields not known to the indexer are kept in `extra` and written into the
/// index document unchanged. `valid_since`/`valid_until` hold approximate date
/// expressions; the translator resolves them to concrete instants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPayload {
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
    #[serde(
        default,
        deserialize_with = "date_expression",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_since: Option<String>,
    #[serde(
        default,
        deserialize_with = "date_expression",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_until: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a dataset message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetPayload {
    /// Dataset identifier, used verbatim as the index name.
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    /// Optional JSON-LD context declaring extra fields and their types.
    #[serde(
        rename = "jsonldContext",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub jsonld_context: Option<Map<String, Value>>,
}

/// An object (create/update/delete of a single record inside a dataset).
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMessage {
    pub action: Action,
    pub payload: ObjectPayload,
    pub meta: MessageMeta,
}

impl ObjectMessage {
    pub fn new(action: Action, payload: ObjectPayload, dataset: impl Into<String>) -> Self {
        Self {
            action,
            payload,
            meta: MessageMeta {
                dataset: dataset.into(),
            },
        }
    }

    /// The index this object is written to.
    pub fn dataset(&self) -> &str {
        &self.meta.dataset
    }
}

/// A dataset lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMessage {
    pub action: Action,
    pub payload: DatasetPayload,
}

impl DatasetMessage {
    pub fn new(action: Action, payload: DatasetPayload) -> Self {
        Self { action, payload }
    }
}

/// A message relevant to the search index.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Object(ObjectMessage),
    Dataset(DatasetMessage),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    action: Value,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    meta: Value,
}

impl Message {
    /// Parse a message from a JSON value.
    ///
    /// Returns `Ok(None)` when the envelope is well formed but its type is
    /// neither `object` nor `dataset`.
    pub fn from_json(value: Value) -> Result<Option<Self>, serde_json::Error> {
        let envelope: Envelope = serde_json::from_value(value)?;

        match envelope.message_type.as_str() {
            "object" => Ok(Some(Message::Object(ObjectMessage {
                action: serde_json::from_value(envelope.action)?,
                payload: serde_json::from_value(envelope.payload)?,
                meta: serde_json::from_value(envelope.meta)?,
            }))),
            "dataset" => Ok(Some(Message::Dataset(DatasetMessage {
                action: serde_json::from_value(envelope.action)?,
                payload: serde_json::from_value(envelope.payload)?,
            }))),
            _ => Ok(None),
        }
    }

    /// Parse a message from one line of NDJSON.
    pub fn from_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        Self::from_json(serde_json::from_str(line)?)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Message::Object(_))
    }
}

/// Identifiers are strings, but numeric ids are accepted and kept in their
/// JSON rendering.
fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, found {}",
            other
        ))),
    }
}

/// Date expressions are usually strings, but bare years often show up as numbers.
fn date_expression<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a date expression, found {}",
            other
        ))),
    }
}
