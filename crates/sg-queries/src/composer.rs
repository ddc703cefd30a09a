//! Query composer
//!
//! Turns a grid definition, the request scope and a `SearchCriteria` into
//! the list query and the count query for one grid page. Both queries share
//! the same base (source table, lookup joins, shop scope, filters); only the
//! list query carries projection, ordering and pagination. Criteria are
//! validated while composing, so an invalid request never yields a query.

use std::collections::BTreeMap;

use sg_core::{GridError, Pagination};
use tracing::debug;

use crate::criteria::{ScopeContext, SearchCriteria};
use crate::definition::{GridDefinition, Projected};
use crate::filters::{contains_pattern, Bound, FilterKind, FilterValue, RangeValue};
use crate::sorts::{SortDirection, Sorting};
use crate::sql::{CompareOp, Expr, SelectItem, SelectQuery, TableRef};
use crate::values::SqlValue;

/// Builds list and count queries for one grid
#[derive(Debug, Clone)]
pub struct QueryComposer {
    grid: &'static GridDefinition,
    table_prefix: String,
    scope: ScopeContext,
}

impl QueryComposer {
    pub fn new(
        grid: &'static GridDefinition,
        table_prefix: impl Into<String>,
        scope: ScopeContext,
    ) -> Self {
        Self {
            grid,
            table_prefix: table_prefix.into(),
            scope,
        }
    }

    pub fn grid(&self) -> &'static GridDefinition {
        self.grid
    }

    pub fn scope(&self) -> &ScopeContext {
        &self.scope
    }

    /// Query for one page of rows
    ///
    /// Rows are ordered by the requested sort field, then by primary key
    /// ascending so that pages never overlap. Without a sort field the
    /// primary key alone orders the rows.
    pub fn build_list_query(&self, criteria: &SearchCriteria) -> Result<SelectQuery, GridError> {
        let query = self.base_query(criteria)?;
        let query = self.apply_sorting(query, criteria.sorting.as_ref())?;
        let query = apply_pagination(query, criteria.pagination)?;
        let query = query.select(self.projection());

        debug!(
            grid = self.grid.name,
            sql = %query.to_sql(),
            params = query.params().len(),
            "Composed list query"
        );
        Ok(query)
    }

    /// Query for the number of rows matching scope and filters
    ///
    /// Sorting and pagination are ignored, so the result is the total that
    /// the pages of `build_list_query` add up to.
    pub fn build_count_query(&self, criteria: &SearchCriteria) -> Result<SelectQuery, GridError> {
        let query = self
            .base_query(criteria)?
            .select(vec![SelectItem::CountAll]);

        debug!(
            grid = self.grid.name,
            sql = %query.to_sql(),
            params = query.params().len(),
            "Composed count query"
        );
        Ok(query)
    }

    fn base_query(&self, criteria: &SearchCriteria) -> Result<SelectQuery, GridError> {
        let mut query = SelectQuery::from_table(self.table(self.grid.table, self.grid.alias));

        for join in self.grid.joins {
            let mut on: Vec<Expr> = join
                .on
                .iter()
                .map(|(left, right)| Expr::eq(Expr::Column(left.to_ref()), Expr::Column(right.to_ref())))
                .collect();
            if let Some(lang_column) = join.lang_column {
                let lang = query.bind(self.scope.lang_id());
                on.push(Expr::eq(Expr::column(join.alias, lang_column), lang));
            }
            let on = if on.len() == 1 {
                on.remove(0)
            } else {
                Expr::And(on)
            };
            query = query.left_join(self.table(join.table, join.alias), on);
        }

        let query = self.apply_base_scope(query);
        self.apply_filters(query, &criteria.filters)
    }

    /// Restrict rows to entities associated with at least one allowed shop
    ///
    /// An EXISTS sub-query keeps one row per entity no matter how many of
    /// the allowed shops it belongs to.
    fn apply_base_scope(&self, mut query: SelectQuery) -> SelectQuery {
        let Some(membership) = self.grid.scope else {
            return query;
        };

        let shops = query.bind(self.scope.shop_ids().to_vec());
        let in_scope = SelectQuery::from_table(self.table(membership.table, membership.alias))
            .select(vec![SelectItem::One])
            .and_where(Expr::eq(
                Expr::column(membership.alias, membership.entity_column),
                Expr::Column(self.grid.primary_key_col().to_ref()),
            ))
            .and_where(Expr::any_of(
                Expr::column(membership.alias, membership.scope_column),
                shops,
            ));

        query.and_where(Expr::exists(in_scope))
    }

    fn apply_filters(
        &self,
        mut query: SelectQuery,
        filters: &BTreeMap<String, FilterValue>,
    ) -> Result<SelectQuery, GridError> {
        for (name, value) in filters {
            let field = self
                .grid
                .filter(name)
                .ok_or_else(|| GridError::InvalidFilterField {
                    grid: self.grid.name,
                    field: name.clone(),
                })?;
            let column = Expr::Column(field.column.to_ref());

            match (field.kind, value) {
                (FilterKind::Exact, FilterValue::Scalar(scalar)) => {
                    let param = query.bind(field.coerce(scalar, None)?);
                    query = query.and_where(Expr::eq(column, param));
                }
                (FilterKind::PartialText, FilterValue::Scalar(scalar)) => {
                    let SqlValue::Text(text) = field.coerce(scalar, None)? else {
                        return Err(field.shape_mismatch(value));
                    };
                    let pattern = query.bind(contains_pattern(&text));
                    query = query.and_where(Expr::ilike(column, pattern));
                }
                (FilterKind::Range, FilterValue::Range(RangeValue { from, to })) => {
                    if let Some(from) = from {
                        let param = query.bind(field.coerce(from, Some(Bound::Lower))?);
                        query = query.and_where(Expr::compare(column.clone(), CompareOp::Gte, param));
                    }
                    if let Some(to) = to {
                        let param = query.bind(field.coerce(to, Some(Bound::Upper))?);
                        query = query.and_where(Expr::compare(column, CompareOp::Lte, param));
                    }
                }
                (FilterKind::OneOf, FilterValue::List(values)) => {
                    if values.is_empty() {
                        continue;
                    }
                    let array = query.bind(field.coerce_list(values)?);
                    query = query.and_where(Expr::any_of(column, array));
                }
                (FilterKind::OneOf, FilterValue::Scalar(scalar)) => {
                    let array = query.bind(field.coerce_list(std::slice::from_ref(scalar))?);
                    query = query.and_where(Expr::any_of(column, array));
                }
                _ => return Err(field.shape_mismatch(value)),
            }
        }

        Ok(query)
    }

    fn apply_sorting(
        &self,
        query: SelectQuery,
        sorting: Option<&Sorting>,
    ) -> Result<SelectQuery, GridError> {
        let primary_key = self.grid.primary_key_col();

        let Some(sorting) = sorting else {
            return Ok(query.order_by(primary_key.to_ref(), SortDirection::Asc));
        };

        let field = self
            .grid
            .sort(&sorting.field)
            .ok_or_else(|| GridError::InvalidSortField {
                grid: self.grid.name,
                field: sorting.field.clone(),
            })?;

        let query = query.order_by(field.column.to_ref(), sorting.direction);
        if field.column == primary_key {
            Ok(query)
        } else {
            Ok(query.order_by(primary_key.to_ref(), SortDirection::Asc))
        }
    }

    fn projection(&self) -> Vec<SelectItem> {
        self.grid
            .projection
            .iter()
            .map(|item| match item {
                Projected::Column(column) => SelectItem::Column {
                    column: column.to_ref(),
                    alias: None,
                },
                Projected::Lookup { column, alias } => SelectItem::Column {
                    column: column.to_ref(),
                    alias: Some(alias.to_string()),
                },
            })
            .collect()
    }

    fn table(&self, name: &str, alias: &str) -> TableRef {
        TableRef::new(format!("{}{}", self.table_prefix, name), alias)
    }
}

fn apply_pagination(
    query: SelectQuery,
    pagination: Option<Pagination>,
) -> Result<SelectQuery, GridError> {
    match pagination {
        None => Ok(query),
        Some(pagination) => {
            pagination.validate()?;
            Ok(query.limit(pagination.limit()).offset(pagination.offset()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Scalar;
    use crate::grids::EMPLOYEE;

    fn composer() -> QueryComposer {
        QueryComposer::new(&EMPLOYEE, "ps_", ScopeContext::new(vec![1, 2], 1))
    }

    const COLUMNS: &str = "e.id_employee, e.firstname, e.lastname, e.email, e.id_profile, e.active, \
        e.last_connection_date, pl.name AS profile_name";

    const BASE: &str = "FROM ps_employee e \
        LEFT JOIN ps_profile_lang pl ON (e.id_profile = pl.id_profile AND pl.id_lang = $1) \
        WHERE EXISTS (SELECT 1 FROM ps_employee_shop es WHERE es.id_employee = e.id_employee AND es.id_shop = ANY($2))";

    #[test]
    fn test_list_query_without_criteria() {
        let query = composer().build_list_query(&SearchCriteria::new()).unwrap();

        assert_eq!(
            query.to_sql(),
            format!("SELECT {} {} ORDER BY e.id_employee ASC", COLUMNS, BASE)
        );
        assert_eq!(
            query.params(),
            &[SqlValue::Int(1), SqlValue::IntArray(vec![1, 2])]
        );
    }

    #[test]
    fn test_count_query_ignores_sorting_and_pagination() {
        let criteria = SearchCriteria::new()
            .sort_by("lastname", SortDirection::Desc)
            .paginate(3, 10);
        let query = composer().build_count_query(&criteria).unwrap();

        assert!(query.is_count());
        assert_eq!(query.to_sql(), format!("SELECT COUNT(*) {}", BASE));
    }

    #[test]
    fn test_list_and_count_share_predicates() {
        let criteria = SearchCriteria::new()
            .filter("lastname", FilterValue::scalar("do"))
            .filter("id_profile", FilterValue::list([1_i64, 4]))
            .filter("active", FilterValue::scalar(true))
            .sort_by("email", SortDirection::Asc)
            .paginate(0, 20);

        let list = composer().build_list_query(&criteria).unwrap();
        let count = composer().build_count_query(&criteria).unwrap();

        assert_eq!(list.joins, count.joins);
        assert_eq!(list.predicates, count.predicates);
        assert_eq!(list.params(), count.params());
        assert_eq!(list.predicates.len(), 4);
    }

    #[test]
    fn test_filters_render_in_field_order() {
        let criteria = SearchCriteria::new()
            .filter("lastname", FilterValue::scalar("O'Neil_"))
            .filter("id_profile", FilterValue::list([1_i64, 4]))
            .filter("active", FilterValue::scalar(1_i64))
            .filter(
                "last_connection_date",
                FilterValue::range(Some("2024-01-01".into()), Some("2024-01-31".into())),
            );
        let query = composer().build_count_query(&criteria).unwrap();

        assert_eq!(
            query.to_sql(),
            format!(
                "SELECT COUNT(*) {} AND e.active = $3 AND e.id_profile = ANY($4) \
                 AND e.last_connection_date >= $5 AND e.last_connection_date <= $6 \
                 AND e.lastname ILIKE $7",
                BASE
            )
        );
        assert_eq!(query.params()[2], SqlValue::Bool(true));
        assert_eq!(query.params()[3], SqlValue::IntArray(vec![1, 4]));
        assert_eq!(query.params()[6], SqlValue::Text("%O'Neil\\_%".to_string()));
    }

    #[test]
    fn test_half_open_range() {
        let criteria = SearchCriteria::new().filter(
            "last_connection_date",
            FilterValue::range(None, Some("2024-01-31".into())),
        );
        let query = composer().build_count_query(&criteria).unwrap();

        assert!(query.to_sql().ends_with("AND e.last_connection_date <= $3"));
        assert_eq!(query.params().len(), 3);
    }

    #[test]
    fn test_empty_one_of_list_adds_no_predicate() {
        let criteria = SearchCriteria::new().filter("id_profile", FilterValue::List(vec![]));
        let query = composer().build_count_query(&criteria).unwrap();

        assert_eq!(query.predicates.len(), 1);
    }

    #[test]
    fn test_sort_appends_primary_key_tie_break() {
        let criteria = SearchCriteria::new()
            .sort_by("profile_name", SortDirection::Desc)
            .paginate(2, 25);
        let sql = composer().build_list_query(&criteria).unwrap().to_sql();

        assert!(sql.ends_with("ORDER BY pl.name DESC, e.id_employee ASC LIMIT 25 OFFSET 50"));
    }

    #[test]
    fn test_sort_by_primary_key_is_not_duplicated() {
        let criteria = SearchCriteria::new().sort_by("id_employee", SortDirection::Desc);
        let sql = composer().build_list_query(&criteria).unwrap().to_sql();

        assert!(sql.ends_with("ORDER BY e.id_employee DESC"));
    }

    #[test]
    fn test_unknown_filter_field_is_rejected() {
        let criteria = SearchCriteria::new().filter("password", FilterValue::scalar("x"));

        assert_eq!(
            composer().build_list_query(&criteria),
            Err(GridError::InvalidFilterField {
                grid: "employee",
                field: "password".to_string(),
            })
        );
        assert!(composer().build_count_query(&criteria).is_err());
    }

    #[test]
    fn test_unknown_sort_field_fails_list_only() {
        let criteria = SearchCriteria::new().sort_by("passwd; DROP TABLE x", SortDirection::Asc);

        assert!(matches!(
            composer().build_list_query(&criteria),
            Err(GridError::InvalidSortField { .. })
        ));
        assert!(composer().build_count_query(&criteria).is_ok());
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let criteria = SearchCriteria::new().paginate(0, 0);

        assert_eq!(
            composer().build_list_query(&criteria),
            Err(GridError::InvalidPagination { page_size: 0 })
        );
    }

    #[test]
    fn test_value_shape_must_match_filter_kind() {
        let criteria = SearchCriteria::new().filter(
            "lastname",
            FilterValue::range(Some(Scalar::from("a")), None),
        );

        assert!(matches!(
            composer().build_list_query(&criteria),
            Err(GridError::InvalidFilterValue { ref field, .. }) if field == "lastname"
        ));
    }

    #[test]
    fn test_table_prefix_is_applied() {
        let composer = QueryComposer::new(&EMPLOYEE, "shop_", ScopeContext::new(vec![1], 2));
        let sql = composer.build_count_query(&SearchCriteria::new()).unwrap().to_sql();

        assert!(sql.contains("FROM shop_employee e"));
        assert!(sql.contains("LEFT JOIN shop_profile_lang pl"));
        assert!(sql.contains("FROM shop_employee_shop es"));
    }
}
