//! Resolution of approximate date expressions.
//!
//! Objects give their validity as loose expressions such as `1850`, `1850s`,
//! `c. 1900` or `1850-03/1861`. Every expression resolves to a range of
//! instants: `validSince` takes the earliest instant of its expression and
//! `validUntil` the latest.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use thiserror::Error;

/// Years either side of a circa expression.
const CIRCA_YEARS: i32 = 5;

const CIRCA_PREFIXES: [&str; 5] = ["circa", "ca.", "c.", "ca", "~"];

/// A date expression that cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot resolve date '{expression}': {reason}")]
pub struct DateError {
    pub expression: String,
    pub reason: String,
}

impl DateError {
    fn new(expression: &str, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Inclusive range of instants covered by an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

/// Resolves date expressions to ranges.
pub trait DateResolver: Send + Sync {
    fn resolve(&self, expression: &str) -> Result<DateRange, DateError>;
}

/// Resolves the expression forms found in historical datasets.
///
/// | Form | Example | Range |
/// |------|---------|-------|
/// | year | `1850` | whole year |
/// | month | `1850-03` | whole month |
/// | day | `1850-03-14` | whole day |
/// | timestamp | `1850-03-14T10:00:00Z` | that instant |
/// | decade | `1850s` | 1850 through 1859 |
/// | circa | `c. 1850`, `ca. 1850`, `circa 1850`, `~1850` | 1845 through 1855 |
/// | interval | `1850/1861-06` | start of the first to end of the second |
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyDateResolver;

impl FuzzyDateResolver {
    pub fn new() -> Self {
        Self
    }

    fn resolve_single(&self, expression: &str) -> Result<DateRange, DateError> {
        if let Some(year) = strip_circa(expression) {
            let year = parse_year(expression, year)?;
            return year_span(expression, year - CIRCA_YEARS, year + CIRCA_YEARS);
        }

        if let Some(decade) = expression.strip_suffix('s') {
            let year = parse_year(expression, decade)?;
            if year % 10 != 0 {
                return Err(DateError::new(expression, "decade must end in 0"));
            }
            return year_span(expression, year, year + 9);
        }

        if let Ok(instant) = DateTime::parse_from_rfc3339(expression) {
            let instant = instant.with_timezone(&Utc);
            return Ok(DateRange {
                earliest: instant,
                latest: instant,
            });
        }

        let parts: Vec<&str> = expression.split('-').collect();
        match parts.as_slice() {
            [year] => {
                let year = parse_year(expression, year)?;
                year_span(expression, year, year)
            }
            [year, month] => {
                let year = parse_year(expression, year)?;
                let month = parse_component(expression, month)?;
                month_span(expression, year, month)
            }
            [year, month, day] => {
                let year = parse_year(expression, year)?;
                let month = parse_component(expression, month)?;
                let day = parse_component(expression, day)?;
                let date = NaiveDate::from_ymd_opt(year, month, day)
                    .ok_or_else(|| DateError::new(expression, "no such day"))?;
                day_span(expression, date, date)
            }
            _ => Err(DateError::new(expression, "unrecognized form")),
        }
    }
}

impl DateResolver for FuzzyDateResolver {
    fn resolve(&self, expression: &str) -> Result<DateRange, DateError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(DateError::new(expression, "expression is empty"));
        }

        match expression.split_once('/') {
            Some((start, end)) => {
                let start = self.resolve_single(start.trim())?;
                let end = self.resolve_single(end.trim())?;
                if start.earliest > end.latest {
                    return Err(DateError::new(expression, "interval ends before it starts"));
                }
                Ok(DateRange {
                    earliest: start.earliest,
                    latest: end.latest,
                })
            }
            None => self.resolve_single(expression),
        }
    }
}

fn strip_circa(expression: &str) -> Option<&str> {
    let lower = expression.to_ascii_lowercase();
    CIRCA_PREFIXES
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
        .map(|prefix| expression[prefix.len()..].trim_start())
}

fn parse_year(expression: &str, year: &str) -> Result<i32, DateError> {
    if year.is_empty() || year.len() > 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateError::new(expression, format!("'{}' is not a year", year)));
    }
    year.parse()
        .map_err(|_| DateError::new(expression, format!("'{}' is not a year", year)))
}

fn parse_component(expression: &str, part: &str) -> Result<u32, DateError> {
    if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateError::new(expression, format!("'{}' is not a two digit field", part)));
    }
    part.parse()
        .map_err(|_| DateError::new(expression, format!("'{}' is not a number", part)))
}

fn year_span(expression: &str, first: i32, last: i32) -> Result<DateRange, DateError> {
    let start = NaiveDate::from_ymd_opt(first, 1, 1);
    let end = NaiveDate::from_ymd_opt(last, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => day_span(expression, start, end),
        _ => Err(DateError::new(expression, "year out of range")),
    }
}

fn month_span(expression: &str, year: i32, month: u32) -> Result<DateRange, DateError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DateError::new(expression, "no such month"))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| DateError::new(expression, "month out of range"))?;
    day_span(expression, start, end)
}

/// From the first millisecond of `start` to the last millisecond of `end`.
fn day_span(expression: &str, start: NaiveDate, end: NaiveDate) -> Result<DateRange, DateError> {
    let earliest = start.and_hms_opt(0, 0, 0);
    let latest = end.and_hms_milli_opt(23, 59, 59, 999);
    match (earliest, latest) {
        (Some(earliest), Some(latest)) => Ok(DateRange {
            earliest: Utc.from_utc_datetime(&earliest),
            latest: Utc.from_utc_datetime(&latest),
        }),
        _ => Err(DateError::new(expression, "time out of range")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SecondsFormat;

    fn bounds(expression: &str) -> (String, String) {
        let range = FuzzyDateResolver::new().resolve(expression).unwrap();
        (
            range.earliest.to_rfc3339_opts(SecondsFormat::Millis, true),
            range.latest.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }

    #[test]
    fn test_year_month_and_day() {
        assert_eq!(
            bounds("1850"),
            ("1850-01-01T00:00:00.000Z".to_string(), "1850-12-31T23:59:59.999Z".to_string())
        );
        assert_eq!(
            bounds("1852-02"),
            ("1852-02-01T00:00:00.000Z".to_string(), "1852-02-29T23:59:59.999Z".to_string())
        );
        assert_eq!(
            bounds("1850-12"),
            ("1850-12-01T00:00:00.000Z".to_string(), "1850-12-31T23:59:59.999Z".to_string())
        );
        assert_eq!(
            bounds(" 1850-03-14 "),
            ("1850-03-14T00:00:00.000Z".to_string(), "1850-03-14T23:59:59.999Z".to_string())
        );
    }

    #[test]
    fn test_timestamp_is_a_single_instant() {
        assert_eq!(
            bounds("1850-03-14T10:30:00+01:00"),
            ("1850-03-14T09:30:00.000Z".to_string(), "1850-03-14T09:30:00.000Z".to_string())
        );
    }

    #[test]
    fn test_decade_and_circa() {
        assert_eq!(
            bounds("1850s"),
            ("1850-01-01T00:00:00.000Z".to_string(), "1859-12-31T23:59:59.999Z".to_string())
        );
        for expression in ["c. 1900", "ca. 1900", "circa 1900", "~1900", "C.1900"] {
            assert_eq!(
                bounds(expression),
                ("1895-01-01T00:00:00.000Z".to_string(), "1905-12-31T23:59:59.999Z".to_string()),
                "{}",
                expression
            );
        }
    }

    #[test]
    fn test_interval() {
        assert_eq!(
            bounds("1850-03/1861"),
            ("1850-03-01T00:00:00.000Z".to_string(), "1861-12-31T23:59:59.999Z".to_string())
        );
    }

    #[test]
    fn test_unresolvable_expressions() {
        let resolver = FuzzyDateResolver::new();
        for expression in [
            "",
            "   ",
            "last tuesday",
            "1855s",
            "1850-13",
            "1850-02-30",
            "1850-3",
            "18500",
            "1861/1850",
            "1850/",
        ] {
            assert!(
                resolver.resolve(expression).is_err(),
                "Expected error for '{}'",
                expression
            );
        }
    }
}
