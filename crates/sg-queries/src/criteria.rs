//! Search criteria and request scope

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sg_core::{Id, Pagination};

use crate::filters::FilterValue;
use crate::sorts::{SortDirection, Sorting};

/// Filters, sorting, and pagination requested for one grid listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SearchCriteria {
    /// Field name -> filter value; applied in key order
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    #[serde(default)]
    pub sorting: Option<Sorting>,
    /// `None` disables pagination
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter and return self (builder pattern)
    pub fn filter(mut self, field: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sorting = Some(Sorting::new(field, direction));
        self
    }

    pub fn paginate(mut self, page_index: u64, page_size: u64) -> Self {
        self.pagination = Some(Pagination::new(page_index, page_size));
        self
    }

    pub fn unpaginated(mut self) -> Self {
        self.pagination = None;
        self
    }

    /// Check if any filters are set
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}

/// Shop scope and language of the current request
///
/// Resolved by the caller once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
    shop_ids: Vec<Id>,
    lang_id: Id,
}

impl ScopeContext {
    pub fn new(shop_ids: impl Into<Vec<Id>>, lang_id: Id) -> Self {
        let mut shop_ids = shop_ids.into();
        shop_ids.sort_unstable();
        shop_ids.dedup();
        Self { shop_ids, lang_id }
    }

    pub fn shop_ids(&self) -> &[Id] {
        &self.shop_ids
    }

    pub fn lang_id(&self) -> Id {
        self.lang_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Scalar;

    #[test]
    fn test_criteria_builder() {
        let criteria = SearchCriteria::new()
            .filter("lastname", FilterValue::scalar("doe"))
            .sort_by("email", SortDirection::Desc)
            .paginate(2, 25);

        assert!(criteria.has_filters());
        assert_eq!(criteria.sorting, Some(Sorting::desc("email")));
        assert_eq!(criteria.pagination.map(|p| p.offset()), Some(50));
        assert_eq!(criteria.unpaginated().pagination, None);
    }

    #[test]
    fn test_criteria_from_json() {
        let criteria: SearchCriteria = serde_json::from_str(
            r#"{
                "filters": {
                    "firstname": "ann",
                    "id_profile": [1, 4],
                    "last_connection_date": {"from": "2024-01-01", "to": "2024-01-31"}
                },
                "sorting": {"field": "lastname"},
                "pagination": {"page_index": 1, "page_size": 20}
            }"#,
        )
        .unwrap();

        assert_eq!(criteria.filters.len(), 3);
        assert_eq!(
            criteria.filters["id_profile"],
            FilterValue::List(vec![Scalar::Int(1), Scalar::Int(4)])
        );
        assert_eq!(criteria.sorting.unwrap().direction, SortDirection::Asc);
        assert_eq!(criteria.pagination, Some(Pagination::new(1, 20)));
    }

    #[test]
    fn test_criteria_with_misspelled_range_is_rejected() {
        let parsed = serde_json::from_str::<SearchCriteria>(
            r#"{"filters": {"last_connection_date": {"form": "2030-01-01", "too": "2030-12-31"}}}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_empty_json_is_unfiltered_and_unpaginated() {
        let criteria: SearchCriteria = serde_json::from_str("{}").unwrap();
        assert_eq!(criteria, SearchCriteria::new());
    }

    #[test]
    fn test_scope_context_dedups_shop_ids() {
        let scope = ScopeContext::new(vec![3, 1, 3], 2);
        assert_eq!(scope.shop_ids(), &[1, 3]);
        assert_eq!(scope.lang_id(), 2);
    }
}
