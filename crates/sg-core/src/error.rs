//! Core error types for shopgrid
//!
//! Caller-input failures raised while composing grid queries, plus the
//! field-level validation errors collected by form policies.

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type for grid composition and form validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Invalid sort field for grid {grid}: {field}")]
    InvalidSortField { grid: &'static str, field: String },

    #[error("Invalid filter field for grid {grid}: {field}")]
    InvalidFilterField { grid: &'static str, field: String },

    #[error("Invalid value for filter {field}: {message}")]
    InvalidFilterValue { field: String, message: String },

    #[error("Invalid pagination: page size must be greater than 0, got {page_size}")]
    InvalidPagination { page_size: u64 },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Form errors keyed by field name, in field order
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    /// "<field> <message>" lines for display
    pub fn full_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{} {}", field, m)))
            .collect()
    }

    /// Ok when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// HTTP status code mapping for errors
impl GridError {
    pub fn status_code(&self) -> u16 {
        match self {
            GridError::InvalidSortField { .. }
            | GridError::InvalidFilterField { .. }
            | GridError::InvalidFilterValue { .. }
            | GridError::InvalidPagination { .. } => 400,
            GridError::Validation(_) => 422,
            GridError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GridError::InvalidSortField { .. } => "invalid_sort_field",
            GridError::InvalidFilterField { .. } => "invalid_filter_field",
            GridError::InvalidFilterValue { .. } => "invalid_filter_value",
            GridError::InvalidPagination { .. } => "invalid_pagination",
            GridError::Validation(_) => "validation_failed",
            GridError::Config(_) => "configuration_error",
        }
    }

    /// Whether the caller supplied bad input (maps to a "bad request")
    pub fn is_bad_request(&self) -> bool {
        self.status_code() == 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_errors_are_bad_requests() {
        let err = GridError::InvalidFilterField {
            grid: "employee",
            field: "nope".to_string(),
        };
        assert!(err.is_bad_request());
        assert_eq!(err.error_code(), "invalid_filter_field");
        assert_eq!(
            err.to_string(),
            "Invalid filter field for grid employee: nope"
        );

        let err = GridError::InvalidPagination { page_size: 0 };
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_validation_errors() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("reduction", "is invalid");
        errors.add("fixed_price_tax_excluded", "should not be blank");
        errors.add("reduction", "cannot be negative");

        assert!(errors.has_error("fixed_price_tax_excluded"));
        assert!(!errors.has_error("reduction_type"));
        assert_eq!(errors.get("reduction").map(Vec::len), Some(2));
        assert_eq!(
            errors.full_messages(),
            vec![
                "fixed_price_tax_excluded should not be blank".to_string(),
                "reduction is invalid".to_string(),
                "reduction cannot be negative".to_string(),
            ]
        );

        let grid_error = GridError::from(errors.clone());
        assert_eq!(grid_error.status_code(), 422);
        assert!(errors.into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
