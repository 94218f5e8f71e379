//! Document representation written into a dataset index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A translated object, ready to be stored in the search index.
///
/// Geo points use the `[lon, lat]` array order expected by `geo_point`
/// fields. `north_west` and `south_east` are the corners of the object's
/// bounding box: `north_west = [west, north]`, `south_east = [east, south]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub north_west: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub south_east: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_since: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    /// Schema-defined fields carried over from the payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexDocument {
    /// Field names owned by the translator. Payload fields with these names
    /// are never copied into `extra`.
    pub const DERIVED_FIELDS: [&'static str; 3] = ["centroid", "northWest", "southEast"];

    /// Create a document with only the identifying fields set.
    pub fn new(id: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object_type: object_type.into(),
            name: None,
            geometry: None,
            centroid: None,
            north_west: None,
            south_east: None,
            valid_since: None,
            valid_until: None,
            extra: Map::new(),
        }
    }

    /// Convert to the JSON body sent to the engine.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
