//! In-memory datastore
//!
//! Evaluates the `SelectQuery` model over tables of JSON rows, following
//! Postgres semantics where grids depend on them: LEFT JOIN yields NULL for
//! unmatched lookups, comparisons with NULL are never true, ILIKE honours
//! backslash escapes, and ascending order puts NULLs last.
//!
//! Dates are compared as `YYYY-MM-DD` / `YYYY-MM-DD HH:MM:SS` strings, so
//! rows should store them in that form.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use sg_queries::sql::{CompareOp, OrderBy, SelectItem};
use sg_queries::{Expr, SelectQuery, SqlValue};

use crate::datastore::Datastore;
use crate::error::{DatastoreError, DatastoreResult};

type Row = Map<String, JsonValue>;

/// Table alias -> current row (`None` for an unmatched LEFT JOIN)
type Env<'a> = Vec<(&'a str, Option<&'a Row>)>;

#[derive(Debug, Clone, Default)]
pub struct MemoryDatastore {
    tables: HashMap<String, Vec<JsonValue>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows to a table (full, prefixed name), creating it if needed
    pub fn with_rows(
        mut self,
        table: impl Into<String>,
        rows: impl IntoIterator<Item = JsonValue>,
    ) -> Self {
        self.tables.entry(table.into()).or_default().extend(rows);
        self
    }

    fn rows(&self, table: &str) -> DatastoreResult<Vec<&Row>> {
        let rows = self
            .tables
            .get(table)
            .ok_or_else(|| DatastoreError::UnknownTable(table.to_string()))?;

        rows.iter()
            .map(|row| {
                row.as_object().ok_or_else(|| {
                    DatastoreError::Decode(format!("row of {} is not an object", table))
                })
            })
            .collect()
    }

    /// Rows of `query` before projection, sorted and paginated
    fn select<'a>(
        &'a self,
        query: &'a SelectQuery,
        params: &[SqlValue],
        outer: &Env<'a>,
    ) -> DatastoreResult<Vec<Env<'a>>> {
        let mut envs: Vec<Env<'a>> = self
            .rows(&query.from.name)?
            .into_iter()
            .map(|row| {
                let mut env = outer.clone();
                env.push((query.from.alias.as_str(), Some(row)));
                env
            })
            .collect();

        for join in &query.joins {
            let candidates = self.rows(&join.table.name)?;
            let alias = join.table.alias.as_str();
            let mut joined = Vec::with_capacity(envs.len());

            for env in envs {
                let mut matched = false;
                for candidate in &candidates {
                    let mut next = env.clone();
                    next.push((alias, Some(*candidate)));
                    if self.test(&join.on, params, &next)? {
                        joined.push(next);
                        matched = true;
                    }
                }
                if !matched {
                    let mut next = env;
                    next.push((alias, None));
                    joined.push(next);
                }
            }
            envs = joined;
        }

        let mut kept = Vec::with_capacity(envs.len());
        for env in envs {
            let mut keep = true;
            for predicate in &query.predicates {
                if !self.test(predicate, params, &env)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                kept.push(env);
            }
        }

        let kept = sort_envs(kept, &query.order_by)?;

        let offset = query.offset.map_or(0, to_usize);
        let limit = query.limit.map_or(usize::MAX, to_usize);
        Ok(kept.into_iter().skip(offset).take(limit).collect())
    }

    fn test(&self, expr: &Expr, params: &[SqlValue], env: &Env<'_>) -> DatastoreResult<bool> {
        match expr {
            Expr::Compare { left, op, right } => {
                let left = self.value(left, params, env)?;
                let right = self.value(right, params, env)?;
                let ordering = compare(&left, &right);
                Ok(match op {
                    CompareOp::Eq => ordering == Some(Ordering::Equal),
                    CompareOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                    CompareOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                })
            }
            Expr::ILike { expr, pattern } => {
                match (self.value(expr, params, env)?, self.value(pattern, params, env)?) {
                    (JsonValue::String(text), JsonValue::String(pattern)) => {
                        Ok(like_matches(&text.to_lowercase(), &pattern.to_lowercase()))
                    }
                    _ => Ok(false),
                }
            }
            Expr::AnyOf { expr, array } => {
                let value = self.value(expr, params, env)?;
                match self.value(array, params, env)? {
                    JsonValue::Array(items) => Ok(items
                        .iter()
                        .any(|item| compare(&value, item) == Some(Ordering::Equal))),
                    other => Err(DatastoreError::InvalidQuery(format!(
                        "ANY() expects an array, got {}",
                        other
                    ))),
                }
            }
            Expr::And(parts) => {
                for part in parts {
                    if !self.test(part, params, env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Exists(sub) => {
                let outer: Env<'_> = env.clone();
                Ok(!self.select(sub, params, &outer)?.is_empty())
            }
            Expr::Column(_) | Expr::Param(_) => {
                Ok(self.value(expr, params, env)? == JsonValue::Bool(true))
            }
        }
    }

    fn value(&self, expr: &Expr, params: &[SqlValue], env: &Env<'_>) -> DatastoreResult<JsonValue> {
        match expr {
            Expr::Column(column) => lookup(env, &column.table, &column.column),
            Expr::Param(index) => params.get(*index).map(param_to_json).ok_or_else(|| {
                DatastoreError::InvalidQuery(format!("missing parameter ${}", index + 1))
            }),
            predicate => self.test(predicate, params, env).map(JsonValue::Bool),
        }
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn fetch_rows(&self, query: &SelectQuery) -> DatastoreResult<Vec<JsonValue>> {
        let envs = self.select(query, query.params(), &Vec::new())?;
        envs.iter().map(|env| project(&query.projection, env)).collect()
    }

    async fn fetch_count(&self, query: &SelectQuery) -> DatastoreResult<i64> {
        if !query.is_count() {
            return Err(DatastoreError::InvalidQuery(
                "expected a count query".to_string(),
            ));
        }
        let envs = self.select(query, query.params(), &Vec::new())?;
        Ok(envs.len() as i64)
    }
}

fn lookup(env: &Env<'_>, table: &str, column: &str) -> DatastoreResult<JsonValue> {
    let (_, row) = env
        .iter()
        .rev()
        .find(|(alias, _)| *alias == table)
        .ok_or_else(|| DatastoreError::InvalidQuery(format!("unknown table alias {}", table)))?;

    Ok(row
        .and_then(|row| row.get(column))
        .cloned()
        .unwrap_or(JsonValue::Null))
}

fn project(items: &[SelectItem], env: &Env<'_>) -> DatastoreResult<JsonValue> {
    let mut out = Row::new();
    for item in items {
        match item {
            SelectItem::AllColumns(alias) => {
                if let Some((_, Some(row))) = env.iter().rev().find(|(a, _)| *a == alias.as_str()) {
                    out.extend(row.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            SelectItem::Column { column, alias } => {
                let name = alias.clone().unwrap_or_else(|| column.column.clone());
                out.insert(name, lookup(env, &column.table, &column.column)?);
            }
            SelectItem::CountAll | SelectItem::One => {
                return Err(DatastoreError::InvalidQuery(
                    "aggregate projection in a row query".to_string(),
                ))
            }
        }
    }
    Ok(JsonValue::Object(out))
}

fn sort_envs<'a>(envs: Vec<Env<'a>>, order_by: &[OrderBy]) -> DatastoreResult<Vec<Env<'a>>> {
    if order_by.is_empty() {
        return Ok(envs);
    }

    let mut keyed = envs
        .into_iter()
        .map(|env| {
            let keys = order_by
                .iter()
                .map(|o| lookup(&env, &o.column.table, &o.column.column))
                .collect::<DatastoreResult<Vec<_>>>()?;
            Ok((keys, env))
        })
        .collect::<DatastoreResult<Vec<_>>>()?;

    keyed.sort_by(|(a, _), (b, _)| {
        for ((a, b), order) in a.iter().zip(b).zip(order_by) {
            let ordering = match order.direction {
                sg_queries::SortDirection::Asc => nulls_last(a, b),
                sg_queries::SortDirection::Desc => nulls_last(a, b).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    Ok(keyed.into_iter().map(|(_, env)| env).collect())
}

fn nulls_last(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(a, b).unwrap_or(Ordering::Equal),
    }
}

/// SQL-style comparison; `None` when either side is NULL or types differ
fn compare(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Number(a), JsonValue::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn param_to_json(value: &SqlValue) -> JsonValue {
    match value {
        SqlValue::Bool(v) => JsonValue::from(*v),
        SqlValue::Int(v) => JsonValue::from(*v),
        SqlValue::Float(v) => JsonValue::from(*v),
        SqlValue::Text(v) => JsonValue::from(v.as_str()),
        SqlValue::Date(v) => JsonValue::from(v.format("%Y-%m-%d").to_string()),
        SqlValue::DateTime(v) => JsonValue::from(v.format("%Y-%m-%d %H:%M:%S").to_string()),
        SqlValue::IntArray(v) => JsonValue::from(v.clone()),
        SqlValue::TextArray(v) => JsonValue::from(v.clone()),
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

enum LikeToken {
    AnyRun,
    AnyChar,
    Literal(char),
}

fn parse_like(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyChar,
            c => LikeToken::Literal(c),
        });
    }
    tokens
}

/// LIKE matching with `\` as escape character
fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    // reachable[j]: the tokens consumed so far match text[..j]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;

    for token in parse_like(pattern) {
        let mut next = vec![false; text.len() + 1];
        match token {
            LikeToken::AnyRun => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= reachable[j];
                    next[j] = seen;
                }
            }
            LikeToken::AnyChar => {
                for j in 1..=text.len() {
                    next[j] = reachable[j - 1];
                }
            }
            LikeToken::Literal(c) => {
                for j in 1..=text.len() {
                    next[j] = reachable[j - 1] && text[j - 1] == c;
                }
            }
        }
        reachable = next;
    }

    reachable[text.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sg_queries::sql::TableRef;

    #[test]
    fn test_like_matches() {
        assert!(like_matches("o'neil", "%neil%"));
        assert!(like_matches("a_b", "a\\_b"));
        assert!(!like_matches("axb", "a\\_b"));
        assert!(like_matches("axb", "a_b"));
        assert!(like_matches("100%", "%0\\%"));
        assert!(!like_matches("1000", "%0\\%"));
        assert!(like_matches("", "%"));
    }

    #[test]
    fn test_compare_with_null_is_unknown() {
        assert_eq!(compare(&JsonValue::Null, &json!(1)), None);
        assert_eq!(compare(&json!(1), &json!(1.0)), Some(Ordering::Equal));
        assert_eq!(compare(&json!("b"), &json!("a")), Some(Ordering::Greater));
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let store = MemoryDatastore::new();
        let query = SelectQuery::from_table(TableRef::new("ps_missing", "m"));

        assert!(matches!(
            store.fetch_rows(&query).await,
            Err(DatastoreError::UnknownTable(ref t)) if t == "ps_missing"
        ));
    }

    #[tokio::test]
    async fn test_left_join_keeps_unmatched_rows() {
        let store = MemoryDatastore::new()
            .with_rows("t", vec![json!({"id": 1, "k": 10}), json!({"id": 2, "k": 20})])
            .with_rows("l", vec![json!({"k": 10, "label": "ten"})]);

        let query = SelectQuery::from_table(TableRef::new("t", "t"))
            .select(vec![
                SelectItem::AllColumns("t".to_string()),
                SelectItem::Column {
                    column: sg_queries::sql::ColumnRef::new("l", "label"),
                    alias: None,
                },
            ])
            .left_join(
                TableRef::new("l", "l"),
                Expr::eq(Expr::column("t", "k"), Expr::column("l", "k")),
            );

        let rows = store.fetch_rows(&query).await.unwrap();
        assert_eq!(
            rows,
            vec![
                json!({"id": 1, "k": 10, "label": "ten"}),
                json!({"id": 2, "k": 20, "label": null}),
            ]
        );
    }

    #[tokio::test]
    async fn test_count_requires_count_projection() {
        let store = MemoryDatastore::new().with_rows("t", vec![json!({"id": 1})]);
        let query = SelectQuery::from_table(TableRef::new("t", "t"));

        assert!(matches!(
            store.fetch_count(&query).await,
            Err(DatastoreError::InvalidQuery(_))
        ));
        assert_eq!(
            store
                .fetch_count(&query.select(vec![SelectItem::CountAll]))
                .await
                .unwrap(),
            1
        );
    }
}
