//! Search parameter types.
//!
//! Every field of [`SearchParams`] is optional; an absent field places no
//! constraint on that axis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An axis-aligned box in longitude/latitude.
///
/// On the wire a box is a pair of `[lon, lat]` corners. The corners may be
/// given in any order; they are normalized so that `west <= east` and
/// `south <= north`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Build a box from two opposite `[lon, lat]` corners.
    pub fn from_corners(a: [f64; 2], b: [f64; 2]) -> Self {
        Self {
            west: a[0].min(b[0]),
            south: a[1].min(b[1]),
            east: a[0].max(b[0]),
            north: a[1].max(b[1]),
        }
    }

    /// The `[lon, lat]` of the top-left (north-west) corner.
    pub fn top_left(&self) -> [f64; 2] {
        [self.west, self.north]
    }

    /// The `[lon, lat]` of the bottom-right (south-east) corner.
    pub fn bottom_right(&self) -> [f64; 2] {
        [self.east, self.south]
    }

    /// Check that every coordinate is finite and inside the valid lon/lat range.
    pub fn validate(&self) -> Result<(), String> {
        let lons = [self.west, self.east];
        let lats = [self.south, self.north];

        if lons
            .iter()
            .chain(lats.iter())
            .any(|value| !value.is_finite())
        {
            return Err("Bounding box coordinates must be finite numbers".to_string());
        }
        if lons.iter().any(|lon| !(-180.0..=180.0).contains(lon)) {
            return Err("Bounding box longitude must be between -180 and 180".to_string());
        }
        if lats.iter().any(|lat| !(-90.0..=90.0).contains(lat)) {
            return Err("Bounding box latitude must be between -90 and 90".to_string());
        }
        Ok(())
    }
}

impl From<[[f64; 2]; 2]> for BoundingBox {
    fn from(corners: [[f64; 2]; 2]) -> Self {
        Self::from_corners(corners[0], corners[1])
    }
}

impl From<BoundingBox> for [[f64; 2]; 2] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.top_left(), bbox.bottom_right()]
    }
}

/// Structured search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchParams {
    /// Free-text name query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Match `name` exactly (case-insensitive) instead of as analyzed text.
    #[serde(default)]
    pub exact: bool,

    /// Accept documents whose type equals any of these values.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,

    /// Accept documents with either bounding box corner inside this box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<BoundingBox>,

    /// Same containment test as `geometry`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<BoundingBox>,

    /// Accept documents valid since at most this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<Utc>>,

    /// Accept documents valid until at least this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<DateTime<Utc>>,

    /// Restrict the search to these dataset indices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Vec<String>>,

    /// Number of hits to skip, for callers paging through results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl SearchParams {
    /// Create empty search parameters (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_geometry(mut self, bbox: BoundingBox) -> Self {
        self.geometry = Some(bbox);
        self
    }

    pub fn with_contains(mut self, bbox: BoundingBox) -> Self {
        self.contains = Some(bbox);
        self
    }

    pub fn with_before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    pub fn with_after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    pub fn with_datasets<I, S>(mut self, datasets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dataset = Some(datasets.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The name query, if it has any non-whitespace content.
    pub fn name_query(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// The type filter, if it lists at least one type.
    pub fn type_filter(&self) -> Option<&[String]> {
        self.types.as_deref().filter(|types| !types.is_empty())
    }

    /// The dataset restriction, if it lists at least one dataset.
    pub fn dataset_filter(&self) -> Option<&[String]> {
        self.dataset
            .as_deref()
            .filter(|datasets| !datasets.is_empty())
    }

    /// Validate the parameters.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(bbox) = &self.geometry {
            bbox.validate().map_err(|e| format!("geometry: {}", e))?;
        }
        if let Some(bbox) = &self.contains {
            bbox.validate().map_err(|e| format!("contains: {}", e))?;
        }
        if let Some(types) = self.type_filter() {
            if types.iter().any(|t| t.trim().is_empty()) {
                return Err("type values cannot be empty".to_string());
            }
        }
        Ok(())
    }
}
