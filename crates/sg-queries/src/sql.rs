//! SELECT statement model
//!
//! A `SelectQuery` is built step by step (source table, joins, predicates,
//! projection, ordering, limit/offset) and rendered to Postgres SQL with
//! `$n` placeholders. Parameters are owned by the top-level query; nested
//! `EXISTS` sub-queries reference them by index.

use std::fmt::Write;

use crate::sorts::SortDirection;
use crate::values::SqlValue;

const MAX_BIGINT: u64 = i64::MAX as u64;

/// A table in the FROM/JOIN list, with its alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

/// `alias.column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gte,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// Predicate and value expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    /// Index into the owning query's parameter list (0-based)
    Param(usize),
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    /// Case-insensitive LIKE; the pattern carries its own `%` wildcards
    ILike {
        expr: Box<Expr>,
        pattern: Box<Expr>,
    },
    /// `expr = ANY(array)`
    AnyOf {
        expr: Box<Expr>,
        array: Box<Expr>,
    },
    And(Vec<Expr>),
    Exists(Box<SelectQuery>),
}

impl Expr {
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Column(ColumnRef::new(table, column))
    }

    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Self::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::compare(left, CompareOp::Eq, right)
    }

    pub fn ilike(expr: Expr, pattern: Expr) -> Self {
        Self::ILike {
            expr: Box::new(expr),
            pattern: Box::new(pattern),
        }
    }

    pub fn any_of(expr: Expr, array: Expr) -> Self {
        Self::AnyOf {
            expr: Box::new(expr),
            array: Box::new(array),
        }
    }

    pub fn exists(query: SelectQuery) -> Self {
        Self::Exists(Box::new(query))
    }

    fn render(&self, out: &mut String) {
        match self {
            Expr::Column(c) => {
                let _ = write!(out, "{}.{}", c.table, c.column);
            }
            Expr::Param(index) => {
                let _ = write!(out, "${}", index + 1);
            }
            Expr::Compare { left, op, right } => {
                left.render(out);
                let _ = write!(out, " {} ", op.as_sql());
                right.render(out);
            }
            Expr::ILike { expr, pattern } => {
                expr.render(out);
                out.push_str(" ILIKE ");
                pattern.render(out);
            }
            Expr::AnyOf { expr, array } => {
                expr.render(out);
                out.push_str(" = ANY(");
                array.render(out);
                out.push(')');
            }
            Expr::And(parts) => {
                out.push('(');
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" AND ");
                    }
                    part.render(out);
                }
                out.push(')');
            }
            Expr::Exists(query) => {
                out.push_str("EXISTS (");
                query.render(out);
                out.push(')');
            }
        }
    }
}

/// One item of the SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `alias.*`
    AllColumns(String),
    Column {
        column: ColumnRef,
        alias: Option<String>,
    },
    /// `COUNT(*)`
    CountAll,
    /// `1`, for existence sub-queries
    One,
}

/// LEFT JOIN with its ON condition
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub on: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// Intermediate representation of a SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub projection: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    /// Conjunction of predicates (WHERE a AND b ...)
    pub predicates: Vec<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    params: Vec<SqlValue>,
}

impl SelectQuery {
    /// Start a query on a source table; projection defaults to `alias.*`
    pub fn from_table(table: TableRef) -> Self {
        Self {
            projection: vec![SelectItem::AllColumns(table.alias.clone())],
            from: table,
            joins: vec![],
            predicates: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
            params: vec![],
        }
    }

    /// Replace the SELECT list
    pub fn select(mut self, projection: Vec<SelectItem>) -> Self {
        self.projection = projection;
        self
    }

    pub fn left_join(mut self, table: TableRef, on: Expr) -> Self {
        self.joins.push(Join { table, on });
        self
    }

    pub fn and_where(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, column: ColumnRef, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy { column, direction });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Register a bound parameter and get the placeholder expression for it
    pub fn bind(&mut self, value: impl Into<SqlValue>) -> Expr {
        self.params.push(value.into());
        Expr::Param(self.params.len() - 1)
    }

    /// Bound parameters, in placeholder order (`$1` is index 0)
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn is_count(&self) -> bool {
        matches!(self.projection.as_slice(), [SelectItem::CountAll])
    }

    /// Render as Postgres SQL
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(256);
        self.render(&mut out);
        out
    }

    /// Render with the SELECT list folded into one `jsonb` object per row
    ///
    /// Keys are the projected column names (or their aliases). ORDER BY,
    /// LIMIT and OFFSET stay on the same statement, so rows come back in
    /// query order.
    pub fn to_json_sql(&self) -> String {
        let mut out = String::with_capacity(256);
        out.push_str("SELECT ");
        self.render_json_projection(&mut out);
        self.render_body(&mut out);
        out
    }

    fn render(&self, out: &mut String) {
        out.push_str("SELECT ");
        for (i, item) in self.projection.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match item {
                SelectItem::AllColumns(alias) => {
                    let _ = write!(out, "{}.*", alias);
                }
                SelectItem::Column { column, alias } => {
                    let _ = write!(out, "{}.{}", column.table, column.column);
                    if let Some(alias) = alias {
                        let _ = write!(out, " AS {}", alias);
                    }
                }
                SelectItem::CountAll => out.push_str("COUNT(*)"),
                SelectItem::One => out.push('1'),
            }
        }
        self.render_body(out);
    }

    fn render_json_projection(&self, out: &mut String) {
        if self.projection.is_empty() {
            out.push_str("'{}'::jsonb");
            return;
        }
        for (i, item) in self.projection.iter().enumerate() {
            if i > 0 {
                out.push_str(" || ");
            }
            match item {
                SelectItem::AllColumns(alias) => {
                    let _ = write!(out, "to_jsonb({})", alias);
                }
                SelectItem::Column { column, alias } => {
                    let key = alias.as_deref().unwrap_or(&column.column);
                    let _ = write!(
                        out,
                        "jsonb_build_object('{}', {}.{})",
                        key, column.table, column.column
                    );
                }
                SelectItem::CountAll => out.push_str("jsonb_build_object('count', COUNT(*))"),
                SelectItem::One => out.push_str("'{}'::jsonb"),
            }
        }
    }

    fn render_body(&self, out: &mut String) {
        let _ = write!(out, " FROM {} {}", self.from.name, self.from.alias);

        for join in &self.joins {
            let _ = write!(out, " LEFT JOIN {} {} ON ", join.table.name, join.table.alias);
            join.on.render(out);
        }

        for (i, predicate) in self.predicates.iter().enumerate() {
            out.push_str(if i == 0 { " WHERE " } else { " AND " });
            predicate.render(out);
        }

        for (i, order) in self.order_by.iter().enumerate() {
            out.push_str(if i == 0 { " ORDER BY " } else { ", " });
            let _ = write!(
                out,
                "{}.{} {}",
                order.column.table,
                order.column.column,
                order.direction.as_sql()
            );
        }

        // LIMIT and OFFSET are bigint in Postgres
        if let Some(limit) = self.limit {
            let _ = write!(out, " LIMIT {}", limit.min(MAX_BIGINT));
        }
        if let Some(offset) = self.offset {
            let _ = write!(out, " OFFSET {}", offset.min(MAX_BIGINT));
        }
    }
}
