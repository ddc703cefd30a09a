//! Grid filters
//!
//! Filters arrive as loosely typed request values (`FilterValue`) keyed by
//! field name. Each grid declares which fields it accepts, how each one
//! filters (`FilterKind`) and the column type its values are coerced into.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sg_core::GridError;

use crate::definition::Col;
use crate::values::{ColumnType, SqlValue};

/// How a recognized filter field turns its value into a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// `column = value`
    Exact,
    /// Case-insensitive substring match
    PartialText,
    /// `column >= from` and/or `column <= to`
    Range,
    /// `column = ANY(values)`
    OneOf,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::PartialText => "partial text",
            Self::Range => "range",
            Self::OneOf => "one of",
        }
    }
}

/// A single request value, before coercion to the column type
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Inclusive bounds of a range filter, each optional
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RangeValue {
    #[serde(default)]
    pub from: Option<Scalar>,
    #[serde(default)]
    pub to: Option<Scalar>,
}

/// Filter value types: scalar, range, or list
///
/// Objects only parse as a range when every key is `from` or `to`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<Scalar>),
    Range(RangeValue),
    Scalar(Scalar),
}

impl FilterValue {
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn range(from: Option<Scalar>, to: Option<Scalar>) -> Self {
        Self::Range(RangeValue { from, to })
    }

    pub fn list<T: Into<Scalar>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::List(_) => "a list",
            Self::Range(_) => "a range",
            Self::Scalar(_) => "a single value",
        }
    }
}

/// Which end of a range a value bounds; date-only input widens to the whole day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// A recognized filter field of a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub name: &'static str,
    pub column: Col,
    pub kind: FilterKind,
    pub column_type: ColumnType,
}

impl FilterField {
    pub const fn new(name: &'static str, column: Col, kind: FilterKind, column_type: ColumnType) -> Self {
        Self {
            name,
            column,
            kind,
            column_type,
        }
    }

    /// Error for a value whose shape does not fit this field's kind
    pub fn shape_mismatch(&self, value: &FilterValue) -> GridError {
        self.invalid(format!(
            "{} filter does not accept {}",
            self.kind.as_str(),
            value.shape()
        ))
    }

    /// Coerce a request value into the column type
    pub fn coerce(&self, scalar: &Scalar, bound: Option<Bound>) -> Result<SqlValue, GridError> {
        match (self.column_type, scalar) {
            (ColumnType::Int, Scalar::Int(i)) => Ok(SqlValue::Int(*i)),
            (ColumnType::Int, Scalar::Text(s)) => s
                .trim()
                .parse()
                .map(SqlValue::Int)
                .map_err(|_| self.invalid(format!("'{}' is not an integer", s))),

            (ColumnType::Float, Scalar::Float(f)) => Ok(SqlValue::Float(*f)),
            (ColumnType::Float, Scalar::Int(i)) => Ok(SqlValue::Float(*i as f64)),
            (ColumnType::Float, Scalar::Text(s)) => s
                .trim()
                .parse()
                .map(SqlValue::Float)
                .map_err(|_| self.invalid(format!("'{}' is not a number", s))),

            (ColumnType::Text, Scalar::Text(s)) => Ok(SqlValue::Text(s.clone())),
            (ColumnType::Text, Scalar::Int(i)) => Ok(SqlValue::Text(i.to_string())),

            (ColumnType::Bool, Scalar::Bool(b)) => Ok(SqlValue::Bool(*b)),
            (ColumnType::Bool, Scalar::Int(0)) => Ok(SqlValue::Bool(false)),
            (ColumnType::Bool, Scalar::Int(1)) => Ok(SqlValue::Bool(true)),
            (ColumnType::Bool, Scalar::Text(s)) => match s.trim() {
                "1" | "true" => Ok(SqlValue::Bool(true)),
                "0" | "false" => Ok(SqlValue::Bool(false)),
                other => Err(self.invalid(format!("'{}' is not a boolean", other))),
            },

            (ColumnType::Date, Scalar::Text(s)) => parse_date(s)
                .map(SqlValue::Date)
                .ok_or_else(|| self.invalid(format!("'{}' is not a date (YYYY-MM-DD)", s))),

            (ColumnType::DateTime, Scalar::Text(s)) => parse_datetime(s, bound)
                .map(SqlValue::DateTime)
                .ok_or_else(|| self.invalid(format!("'{}' is not a date or datetime", s))),

            (expected, other) => Err(self.invalid(format!(
                "expected {:?} value, got {:?}",
                expected, other
            ))),
        }
    }

    /// Coerce a list into a typed array parameter (`int[]` or `text[]`)
    pub fn coerce_list(&self, values: &[Scalar]) -> Result<SqlValue, GridError> {
        match self.column_type {
            ColumnType::Int => values
                .iter()
                .map(|v| match self.coerce(v, None)? {
                    SqlValue::Int(i) => Ok(i),
                    other => Err(self.invalid(format!("expected integer, got {}", other.type_name()))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SqlValue::IntArray),
            ColumnType::Text => values
                .iter()
                .map(|v| match self.coerce(v, None)? {
                    SqlValue::Text(s) => Ok(s),
                    other => Err(self.invalid(format!("expected text, got {}", other.type_name()))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SqlValue::TextArray),
            other => Err(self.invalid(format!("{:?} columns cannot be filtered by a list", other))),
        }
    }

    fn invalid(&self, message: String) -> GridError {
        GridError::InvalidFilterValue {
            field: self.name.to_string(),
            message,
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_datetime(raw: &str, bound: Option<Bound>) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    let date = parse_date(raw)?;
    let time = match bound {
        Some(Bound::Upper) => NaiveTime::from_hms_opt(23, 59, 59)?,
        _ => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(date.and_time(time))
}

/// Build a `%value%` ILIKE pattern with LIKE wildcards in the value escaped
pub fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

/// Escape string for LIKE patterns (backslash is the default escape character)
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: FilterField = FilterField::new(
        "id_employee",
        Col::new("e", "id_employee"),
        FilterKind::Exact,
        ColumnType::Int,
    );

    const SEEN: FilterField = FilterField::new(
        "last_connection_date",
        Col::new("e", "last_connection_date"),
        FilterKind::Range,
        ColumnType::DateTime,
    );

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("test"), "test");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(contains_pattern("it's"), "%it's%");
    }

    #[test]
    fn test_filter_value_deserialization() {
        let scalar: FilterValue = serde_json::from_str(r#""doe""#).unwrap();
        assert_eq!(scalar, FilterValue::scalar("doe"));

        let list: FilterValue = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(list, FilterValue::list([1_i64, 2, 3]));

        let range: FilterValue = serde_json::from_str(r#"{"from": "2024-01-01"}"#).unwrap();
        assert_eq!(range, FilterValue::range(Some("2024-01-01".into()), None));
    }

    #[test]
    fn test_misspelled_range_keys_are_rejected() {
        let misspelled = serde_json::from_str::<FilterValue>(r#"{"form": "2030-01-01", "too": "2030-12-31"}"#);
        assert!(misspelled.is_err());

        let extra = serde_json::from_str::<FilterValue>(r#"{"from": "2030-01-01", "until": "2030-12-31"}"#);
        assert!(extra.is_err());

        let open: FilterValue = serde_json::from_str("{}").unwrap();
        assert_eq!(open, FilterValue::range(None, None));
    }

    #[test]
    fn test_coerce_int_from_text() {
        assert_eq!(ID.coerce(&Scalar::from("42"), None), Ok(SqlValue::Int(42)));
        assert!(matches!(
            ID.coerce(&Scalar::from("forty-two"), None),
            Err(GridError::InvalidFilterValue { .. })
        ));
    }

    #[test]
    fn test_coerce_date_only_range_bounds_cover_whole_day() {
        let from = SEEN.coerce(&Scalar::from("2024-03-01"), Some(Bound::Lower)).unwrap();
        let to = SEEN.coerce(&Scalar::from("2024-03-01"), Some(Bound::Upper)).unwrap();

        assert_eq!(from.type_name(), "datetime");
        match (from, to) {
            (SqlValue::DateTime(from), SqlValue::DateTime(to)) => {
                assert_eq!(from.to_string(), "2024-03-01 00:00:00");
                assert_eq!(to.to_string(), "2024-03-01 23:59:59");
            }
            other => panic!("unexpected values: {:?}", other),
        }
    }

    #[test]
    fn test_coerce_list_builds_typed_array() {
        let profiles = FilterField::new(
            "id_profile",
            Col::new("e", "id_profile"),
            FilterKind::OneOf,
            ColumnType::Int,
        );
        assert_eq!(
            profiles.coerce_list(&[Scalar::Int(1), Scalar::from("4")]),
            Ok(SqlValue::IntArray(vec![1, 4]))
        );
        assert!(profiles.coerce_list(&[Scalar::from("x")]).is_err());
    }

    #[test]
    fn test_coerce_rejects_wrong_type() {
        assert!(matches!(
            SEEN.coerce(&Scalar::Bool(true), Some(Bound::Lower)),
            Err(GridError::InvalidFilterValue { ref field, .. }) if field == "last_connection_date"
        ));
    }
}
