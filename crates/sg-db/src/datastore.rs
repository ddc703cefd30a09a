//! Datastore boundary
//!
//! Executes composed `SelectQuery` values. Rows come back as JSON objects
//! keyed by column name, so one implementation serves every grid.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sg_queries::{SelectQuery, SqlValue};
use sqlx::postgres::{PgArguments, PgPool, Postgres};
use sqlx::query::QueryScalar;
use tracing::debug;

use crate::error::{DatastoreError, DatastoreResult};

/// Executes composed grid queries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Run a list query and return its rows in query order
    async fn fetch_rows(&self, query: &SelectQuery) -> DatastoreResult<Vec<JsonValue>>;

    /// Run a count query
    async fn fetch_count(&self, query: &SelectQuery) -> DatastoreResult<i64>;
}

/// PostgreSQL datastore
///
/// Each call checks a connection out of the pool for the duration of one
/// statement; it goes back to the pool when the call returns, on error too.
#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn fetch_rows(&self, query: &SelectQuery) -> DatastoreResult<Vec<JsonValue>> {
        let sql = rows_sql(query)?;
        debug!(sql = %sql, params = query.params().len(), "Fetching grid rows");

        let mut statement = sqlx::query_scalar::<_, JsonValue>(&sql);
        for param in query.params() {
            statement = bind_value(statement, param);
        }

        Ok(statement.fetch_all(&self.pool).await?)
    }

    async fn fetch_count(&self, query: &SelectQuery) -> DatastoreResult<i64> {
        let sql = count_sql(query)?;
        debug!(sql = %sql, params = query.params().len(), "Counting grid rows");

        let mut statement = sqlx::query_scalar::<_, i64>(&sql);
        for param in query.params() {
            statement = bind_value(statement, param);
        }

        Ok(statement.fetch_one(&self.pool).await?)
    }
}

/// SQL returning one JSON object per row, ordered and paged by the query itself
fn rows_sql(query: &SelectQuery) -> DatastoreResult<String> {
    if query.is_count() {
        return Err(DatastoreError::InvalidQuery(
            "expected a list query, got a count query".to_string(),
        ));
    }
    Ok(query.to_json_sql())
}

fn count_sql(query: &SelectQuery) -> DatastoreResult<String> {
    if !query.is_count() {
        return Err(DatastoreError::InvalidQuery(
            "expected a count query".to_string(),
        ));
    }
    Ok(query.to_sql())
}

/// Bind one parameter; arrays go over as typed Postgres arrays
fn bind_value<'q, O>(
    statement: QueryScalar<'q, Postgres, O, PgArguments>,
    value: &'q SqlValue,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    match value {
        SqlValue::Bool(v) => statement.bind(*v),
        SqlValue::Int(v) => statement.bind(*v),
        SqlValue::Float(v) => statement.bind(*v),
        SqlValue::Text(v) => statement.bind(v.as_str()),
        SqlValue::Date(v) => statement.bind(*v),
        SqlValue::DateTime(v) => statement.bind(*v),
        SqlValue::IntArray(v) => statement.bind(v.as_slice()),
        SqlValue::TextArray(v) => statement.bind(v.as_slice()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_queries::{grids, QueryComposer, ScopeContext, SearchCriteria, SortDirection};

    fn composer() -> QueryComposer {
        QueryComposer::new(&grids::EMPLOYEE, "ps_", ScopeContext::new(vec![1], 1))
    }

    #[test]
    fn test_rows_sql_orders_and_pages_in_one_statement() {
        let criteria = SearchCriteria::new()
            .sort_by("lastname", SortDirection::Desc)
            .paginate(1, 2);
        let query = composer().build_list_query(&criteria).unwrap();
        let sql = rows_sql(&query).unwrap();

        assert!(sql.starts_with(
            "SELECT jsonb_build_object('id_employee', e.id_employee) || "
        ));
        assert!(sql.contains("|| jsonb_build_object('profile_name', pl.name) FROM ps_employee e "));
        assert!(sql.ends_with("ORDER BY e.lastname DESC, e.id_employee ASC LIMIT 2 OFFSET 2"));
        assert_eq!(sql.matches("SELECT").count(), 2, "only the EXISTS sub-query nests");
        assert!(!sql.contains("passwd"));
    }

    #[test]
    fn test_query_kind_must_match_the_call() {
        let list = composer().build_list_query(&SearchCriteria::new()).unwrap();
        let count = composer().build_count_query(&SearchCriteria::new()).unwrap();

        assert_eq!(count_sql(&count).unwrap(), count.to_sql());
        assert!(matches!(rows_sql(&count), Err(DatastoreError::InvalidQuery(_))));
        assert!(matches!(count_sql(&list), Err(DatastoreError::InvalidQuery(_))));
    }
}
