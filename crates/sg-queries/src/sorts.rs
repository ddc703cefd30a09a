//! Grid sort orders
//!
//! A grid request names at most one sort field; the composer resolves it
//! against the grid's allow-list and appends the primary key as tie-break.

use serde::{Deserialize, Serialize};

use crate::definition::Col;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 1-9, oldest first)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest first)
    Desc,
}

impl SortDirection {
    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Get the opposite direction
    pub fn reverse(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Requested sort: a field name from the grid's allow-list plus direction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Sorting {
    /// The field to sort by
    pub field: String,
    /// The sort direction (ascending when omitted)
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sorting {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create ascending sort
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Create descending sort
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// A sortable field: request name mapped to a column or derived alias
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: Col,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::parse("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse("sideways"), None);
        assert_eq!(SortDirection::Asc.reverse(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.as_sql(), "DESC");
    }

    #[test]
    fn test_direction_defaults_to_ascending() {
        let sorting: Sorting = serde_json::from_str(r#"{"field": "lastname"}"#).unwrap();
        assert_eq!(sorting, Sorting::asc("lastname"));

        let sorting: Sorting =
            serde_json::from_str(r#"{"field": "email", "direction": "desc"}"#).unwrap();
        assert_eq!(sorting.direction, SortDirection::Desc);
    }
}
