//! Compiles [`SearchParams`] into the engine's query DSL.
//!
//! The compiled body has the shape
//! `{"size": N, "query": {"bool": {"must": [...]}}}`: every constraint present
//! in the parameters contributes one clause to the top-level `must`, so all
//! of them must hold. An empty `must` matches every document.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use spacetime_indexer_shared::{BoundingBox, SearchParams};

use crate::types::EngineQuery;

/// Number of hits returned per request.
pub const PAGE_SIZE: usize = 100;

/// Stored corner fields tested by bounding-box clauses.
const CORNER_FIELDS: [&str; 2] = ["northWest", "southEast"];

/// Builds engine queries from search parameters.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    page_size: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
        }
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self { page_size }
    }

    /// Compile the parameters into an engine query.
    ///
    /// Parameters are assumed to be validated; see [`SearchParams::validate`].
    pub fn build(&self, params: &SearchParams) -> EngineQuery {
        let mut must = Vec::new();

        if let Some(name) = params.name_query() {
            must.push(name_clause(name, params.exact));
        }
        if let Some(types) = params.type_filter() {
            must.push(type_clause(types));
        }
        if let Some(bbox) = &params.geometry {
            must.push(bounding_box_clause(bbox));
        }
        if let Some(bbox) = &params.contains {
            must.push(bounding_box_clause(bbox));
        }
        if let Some(before) = &params.before {
            must.push(range_clause("validSince", "lte", before));
        }
        if let Some(after) = &params.after {
            must.push(range_clause("validUntil", "gte", after));
        }

        let mut body = Map::new();
        body.insert("size".to_string(), json!(self.page_size));
        if let Some(offset) = params.offset.filter(|offset| *offset > 0) {
            body.insert("from".to_string(), json!(offset));
        }
        body.insert("query".to_string(), json!({ "bool": { "must": must } }));

        EngineQuery {
            indices: params
                .dataset_filter()
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            body: Value::Object(body),
        }
    }
}

/// Text match on `name.exact` or `name.analyzed`.
fn name_clause(name: &str, exact: bool) -> Value {
    let field = if exact { "name.exact" } else { "name.analyzed" };
    json!({
        "query_string": {
            "query": name,
            "fields": [field]
        }
    })
}

/// Type equals any of the listed values.
fn type_clause(types: &[String]) -> Value {
    let should: Vec<Value> = types
        .iter()
        .map(|object_type| json!({ "term": { "type": object_type } }))
        .collect();

    json!({
        "bool": {
            "should": should,
            "minimum_should_match": 1
        }
    })
}

/// Either stored corner falls inside the box.
fn bounding_box_clause(bbox: &BoundingBox) -> Value {
    let [west, north] = bbox.top_left();
    let [east, south] = bbox.bottom_right();

    let should: Vec<Value> = CORNER_FIELDS
        .iter()
        .map(|field| {
            let mut corners = Map::new();
            corners.insert(
                field.to_string(),
                json!({
                    "top_left": { "lat": north, "lon": west },
                    "bottom_right": { "lat": south, "lon": east }
                }),
            );
            json!({ "geo_bounding_box": corners })
        })
        .collect();

    json!({
        "bool": {
            "should": should,
            "minimum_should_match": 1
        }
    })
}

fn range_clause(field: &str, comparator: &str, instant: &DateTime<Utc>) -> Value {
    let mut bound = Map::new();
    bound.insert(
        comparator.to_string(),
        json!(instant.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    let mut range = Map::new();
    range.insert(field.to_string(), Value::Object(bound));
    json!({ "range": range })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn must(query: &EngineQuery) -> &Vec<Value> {
        query.body["query"]["bool"]["must"].as_array().unwrap()
    }

    #[test]
    fn test_empty_params_match_everything() {
        let query = QueryBuilder::new().build(&SearchParams::new());

        assert!(query.indices.is_empty());
        assert_eq!(query.index_pattern(), "*");
        assert_eq!(query.body["size"], 100);
        assert!(query.body.get("from").is_none());
        assert!(must(&query).is_empty());
    }

    #[test]
    fn test_name_uses_analyzed_or_exact_field() {
        let query = QueryBuilder::new().build(&SearchParams::new().with_name("broadway"));
        assert_eq!(
            must(&query)[0],
            json!({ "query_string": { "query": "broadway", "fields": ["name.analyzed"] } })
        );

        let query =
            QueryBuilder::new().build(&SearchParams::new().with_name("Broadway").exact(true));
        assert_eq!(must(&query)[0]["query_string"]["fields"], json!(["name.exact"]));
    }

    #[test]
    fn test_name_and_types_are_combined() {
        let params = SearchParams::new().with_name("x").with_types(["A", "B"]);
        let query = QueryBuilder::new().build(&params);
        let must = must(&query);

        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["query_string"]["query"], "x");
        assert_eq!(
            must[1],
            json!({
                "bool": {
                    "should": [
                        { "term": { "type": "A" } },
                        { "term": { "type": "B" } }
                    ],
                    "minimum_should_match": 1
                }
            })
        );
    }

    #[test]
    fn test_contains_restricted_to_dataset() {
        let params = SearchParams::new()
            .with_datasets(["ds1"])
            .with_contains(BoundingBox::from_corners([0.0, 0.0], [2.0, 2.0]));
        let query = QueryBuilder::new().build(&params);

        assert_eq!(query.indices, vec!["ds1".to_string()]);
        assert_eq!(query.index_pattern(), "ds1");

        let box_bounds = json!({
            "top_left": { "lat": 2.0, "lon": 0.0 },
            "bottom_right": { "lat": 0.0, "lon": 2.0 }
        });
        assert_eq!(
            must(&query)[0],
            json!({
                "bool": {
                    "should": [
                        { "geo_bounding_box": { "northWest": box_bounds } },
                        { "geo_bounding_box": { "southEast": box_bounds } }
                    ],
                    "minimum_should_match": 1
                }
            })
        );
    }

    #[test]
    fn test_geometry_and_contains_are_both_required() {
        let params = SearchParams::new()
            .with_geometry(BoundingBox::from_corners([-74.1, 40.9], [-73.8, 40.6]))
            .with_contains(BoundingBox::from_corners([-74.0, 40.7], [-73.9, 40.8]));
        let query = QueryBuilder::new().build(&params);
        let must = must(&query);

        assert_eq!(must.len(), 2);
        let first = &must[0]["bool"]["should"][0]["geo_bounding_box"]["northWest"];
        assert_eq!(first["top_left"]["lat"], 40.9);
        assert_eq!(first["bottom_right"]["lon"], -73.8);
    }

    #[test]
    fn test_date_ranges() {
        let before = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(1850, 6, 1, 12, 0, 0).unwrap();
        let params = SearchParams::new().with_before(before).with_after(after);
        let query = QueryBuilder::new().build(&params);
        let must = must(&query);

        assert_eq!(
            must[0],
            json!({ "range": { "validSince": { "lte": "1900-01-01T00:00:00.000Z" } } })
        );
        assert_eq!(
            must[1],
            json!({ "range": { "validUntil": { "gte": "1850-06-01T12:00:00.000Z" } } })
        );
    }

    #[test]
    fn test_degenerate_date_range_is_kept() {
        let instant = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap();
        let params = SearchParams::new().with_before(instant).with_after(instant);
        let query = QueryBuilder::new().build(&params);

        assert_eq!(must(&query).len(), 2);
    }

    #[test]
    fn test_offset_and_page_size() {
        let query = QueryBuilder::with_page_size(25).build(&SearchParams::new().with_offset(50));
        assert_eq!(query.body["size"], 25);
        assert_eq!(query.body["from"], 50);
    }

    #[test]
    fn test_empty_type_list_adds_no_clause() {
        let params = SearchParams::new().with_types(Vec::<String>::new());
        let query = QueryBuilder::new().build(&params);
        assert!(must(&query).is_empty());
    }
}
