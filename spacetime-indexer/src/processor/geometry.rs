//! Geometry derivation.
//!
//! Objects carry GeoJSON geometries. The index stores, next to the geometry
//! itself, its centroid and the north-west and south-east corners of its
//! bounding box as `[lon, lat]` points.

use geo::{BoundingRect, Centroid};
use geo_types::Geometry;
use geojson::{GeoJson, Value as GeoJsonValue};
use serde_json::Value;
use thiserror::Error;

/// A geometry that cannot be read or has no extent.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct GeometryError(String);

impl GeometryError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<geojson::Error> for GeometryError {
    fn from(err: geojson::Error) -> Self {
        Self(err.to_string())
    }
}

/// Values derived from a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryExtent {
    /// `[lon, lat]` centroid.
    pub centroid: [f64; 2],
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeometryExtent {
    /// `[min lon, max lat]`.
    pub fn north_west(&self) -> [f64; 2] {
        [self.west, self.north]
    }

    /// `[max lon, min lat]`.
    pub fn south_east(&self) -> [f64; 2] {
        [self.east, self.south]
    }
}

/// Derives centroid and bounding box from a geometry value.
pub trait GeometryDeriver: Send + Sync {
    fn derive(&self, geometry: &Value) -> Result<GeometryExtent, GeometryError>;
}

/// Reads GeoJSON geometries of every type, plus `Feature` wrappers.
///
/// Positions must have at least two finite coordinates, with longitude in
/// `[-180, 180]` and latitude in `[-90, 90]`; extra coordinates (altitude)
/// are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonDeriver;

impl GeoJsonDeriver {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryDeriver for GeoJsonDeriver {
    fn derive(&self, geometry: &Value) -> Result<GeometryExtent, GeometryError> {
        let geometry = parse_geometry(geometry)?;

        let rect = geometry
            .bounding_rect()
            .ok_or_else(|| GeometryError::new("geometry is empty"))?;
        let centroid = geometry
            .centroid()
            .ok_or_else(|| GeometryError::new("geometry has no centroid"))?;

        Ok(GeometryExtent {
            centroid: [centroid.x(), centroid.y()],
            west: rect.min().x,
            south: rect.min().y,
            east: rect.max().x,
            north: rect.max().y,
        })
    }
}

fn parse_geometry(value: &Value) -> Result<Geometry<f64>, GeometryError> {
    let geometry = match GeoJson::from_json_value(value.clone())? {
        GeoJson::Geometry(geometry) => geometry,
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| GeometryError::new("feature has no geometry"))?,
        GeoJson::FeatureCollection(_) => {
            return Err(GeometryError::new("feature collections are not supported"))
        }
    };

    // geo-types indexes positions directly, so shape is checked before converting.
    check_value(&geometry.value)?;
    Ok(Geometry::<f64>::try_from(geometry)?)
}

fn check_value(value: &GeoJsonValue) -> Result<(), GeometryError> {
    match value {
        GeoJsonValue::Point(position) => check_position(position),
        GeoJsonValue::MultiPoint(positions) => {
            positions.iter().try_for_each(|p| check_position(p))
        }
        GeoJsonValue::LineString(line) => check_line(line),
        GeoJsonValue::MultiLineString(lines) => lines.iter().try_for_each(|l| check_line(l)),
        GeoJsonValue::Polygon(rings) => check_polygon(rings),
        GeoJsonValue::MultiPolygon(polygons) => {
            polygons.iter().try_for_each(|p| check_polygon(p))
        }
        GeoJsonValue::GeometryCollection(members) => members
            .iter()
            .try_for_each(|member| check_value(&member.value)),
    }
}

fn check_position(position: &[f64]) -> Result<(), GeometryError> {
    let [lon, lat, ..] = position else {
        return Err(GeometryError::new("position needs longitude and latitude"));
    };
    if !lon.is_finite() || !lat.is_finite() {
        return Err(GeometryError::new("position is not finite"));
    }
    if !(-180.0..=180.0).contains(lon) || !(-90.0..=90.0).contains(lat) {
        return Err(GeometryError::new(format!(
            "position [{}, {}] is out of range",
            lon, lat
        )));
    }
    Ok(())
}

fn check_line(line: &[Vec<f64>]) -> Result<(), GeometryError> {
    if line.len() < 2 {
        return Err(GeometryError::new("line string needs at least two positions"));
    }
    line.iter().try_for_each(|p| check_position(p))
}

fn check_polygon(rings: &[Vec<Vec<f64>>]) -> Result<(), GeometryError> {
    if rings.is_empty() {
        return Err(GeometryError::new("polygon has no rings"));
    }
    rings.iter().try_for_each(|ring| {
        if ring.len() < 4 {
            return Err(GeometryError::new("polygon ring needs at least four positions"));
        }
        ring.iter().try_for_each(|p| check_position(p))
    })
}
