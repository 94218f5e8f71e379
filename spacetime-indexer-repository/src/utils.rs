//! Utility functions for the search indexer repository.

use serde_json::Value;

use crate::errors::SearchIndexError;

/// Engine error types meaning "the index already exists". Older engines use
/// the second name.
const ALREADY_EXISTS_TYPES: [&str; 2] = [
    "resource_already_exists_exception",
    "index_already_exists_exception",
];

const NOT_FOUND_TYPE: &str = "index_not_found_exception";

/// Characters the engine rejects in index names.
const INVALID_INDEX_CHARS: [char; 12] = [
    '\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':',
];

/// Validate that a dataset id can be used as an index name.
///
/// Index names must be non-empty lowercase strings, must not start with
/// `-`, `_` or `+`, must not be `.` or `..`, and must not contain any of
/// `\ / * ? " < > | , # :` or spaces.
///
/// # Example
///
/// ```
/// use spacetime_indexer_repository::validate_index_name;
///
/// assert!(validate_index_name("nyc-streets").is_ok());
/// assert!(validate_index_name("NYC Streets").is_err());
/// ```
pub fn validate_index_name(name: &str) -> Result<(), SearchIndexError> {
    if name.is_empty() {
        return Err(SearchIndexError::validation("Index name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' is reserved",
            name
        )));
    }
    if name.starts_with(&['-', '_', '+'][..]) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' cannot start with '-', '_' or '+'",
            name
        )));
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must be lowercase",
            name
        )));
    }
    if let Some(c) = name.chars().find(|c| INVALID_INDEX_CHARS.contains(c)) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' contains invalid character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// Extract `error.type` from an engine error body, if the body is JSON.
pub fn engine_error_type(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("type")?
        .as_str()
        .map(String::from)
}

/// Classify a failed index-creation response.
pub fn classify_create_failure(index: &str, status: u16, body: &str) -> SearchIndexError {
    match engine_error_type(body) {
        Some(kind) if ALREADY_EXISTS_TYPES.contains(&kind.as_str()) => {
            SearchIndexError::index_already_exists(index)
        }
        _ => SearchIndexError::index_creation(format!(
            "Create index '{}' failed with status {}: {}",
            index, status, body
        )),
    }
}

/// Classify a failed index-deletion response.
pub fn classify_delete_failure(index: &str, status: u16, body: &str) -> SearchIndexError {
    if status == 404 || engine_error_type(body).as_deref() == Some(NOT_FOUND_TYPE) {
        return SearchIndexError::index_not_found(index);
    }
    SearchIndexError::delete(format!(
        "Delete index '{}' failed with status {}: {}",
        index, status, body
    ))
}

/// Classify a failed search response.
pub fn classify_search_failure(index: &str, status: u16, body: &str) -> SearchIndexError {
    if engine_error_type(body).as_deref() == Some(NOT_FOUND_TYPE) {
        return SearchIndexError::index_not_found(index);
    }
    SearchIndexError::search(format!(
        "Search on '{}' failed with status {}: {}",
        index, status, body
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_index_name_valid() {
        for name in ["ds1", "nyc-streets", "building_inspector.v2", "1850s"] {
            assert!(validate_index_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_validate_index_name_invalid() {
        let test_cases = vec![
            ("", "empty"),
            (".", "reserved dot"),
            ("..", "reserved double dot"),
            ("-ds", "leading dash"),
            ("_ds", "leading underscore"),
            ("+ds", "leading plus"),
            ("Streets", "uppercase"),
            ("nyc streets", "space"),
            ("ds*", "wildcard"),
            ("a,b", "comma"),
            ("a/b", "slash"),
            ("a:b", "colon"),
            ("a#b", "hash"),
        ];

        for (name, description) in test_cases {
            let result = validate_index_name(name);
            assert!(
                matches!(result, Err(SearchIndexError::ValidationError(_))),
                "Expected ValidationError for '{}' ({})",
                name,
                description
            );
        }
    }

    #[test]
    fn test_engine_error_type() {
        let body = r#"{"error":{"type":"resource_already_exists_exception","reason":"index [ds1/abc] already exists"},"status":400}"#;
        assert_eq!(
            engine_error_type(body).as_deref(),
            Some("resource_already_exists_exception")
        );
        assert!(engine_error_type("not json").is_none());
        assert!(engine_error_type(r#"{"acknowledged":true}"#).is_none());
    }

    #[test]
    fn test_classify_create_failure() {
        let modern = r#"{"error":{"type":"resource_already_exists_exception"},"status":400}"#;
        let legacy = r#"{"error":{"type":"index_already_exists_exception"},"status":400}"#;
        let other = r#"{"error":{"type":"mapper_parsing_exception"},"status":400}"#;

        assert_eq!(
            classify_create_failure("ds1", 400, modern),
            SearchIndexError::IndexAlreadyExists("ds1".to_string())
        );
        assert_eq!(
            classify_create_failure("ds1", 400, legacy),
            SearchIndexError::IndexAlreadyExists("ds1".to_string())
        );
        assert!(matches!(
            classify_create_failure("ds1", 400, other),
            SearchIndexError::IndexCreationError(_)
        ));
    }

    #[test]
    fn test_classify_delete_failure() {
        let missing = r#"{"error":{"type":"index_not_found_exception"},"status":404}"#;
        assert_eq!(
            classify_delete_failure("ds1", 404, missing),
            SearchIndexError::IndexNotFound("ds1".to_string())
        );
        assert!(matches!(
            classify_delete_failure("ds1", 500, "boom"),
            SearchIndexError::DeleteError(_)
        ));
    }

    #[test]
    fn test_classify_search_failure() {
        let missing = r#"{"error":{"type":"index_not_found_exception"},"status":404}"#;
        assert!(matches!(
            classify_search_failure("ds9", 404, missing),
            SearchIndexError::IndexNotFound(_)
        ));
        assert!(matches!(
            classify_search_failure("*", 400, r#"{"error":{"type":"query_shard_exception"}}"#),
            SearchIndexError::SearchError(_)
        ));
    }
}
