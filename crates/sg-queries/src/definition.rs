//! Grid definitions
//!
//! A `GridDefinition` is the explicit allow-list for one entity listing:
//! its source table, the lookup joins feeding display columns, the
//! scope-membership table used for shop restriction, and the filter and
//! sort fields a request may name. Definitions are `const` data; table
//! names are unprefixed and get the install prefix at composition time.

use crate::filters::FilterField;
use crate::sorts::SortField;
use crate::sql::ColumnRef;

/// Static `alias.column` reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Col {
    pub table: &'static str,
    pub column: &'static str,
}

impl Col {
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self { table, column }
    }

    pub fn to_ref(self) -> ColumnRef {
        ColumnRef::new(self.table, self.column)
    }
}

/// A display column in the list projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projected {
    /// A column exposed under its own name
    Column(Col),
    /// A joined lookup column, exposed under `alias`
    Lookup { column: Col, alias: &'static str },
}

/// LEFT JOIN to a lookup table, optionally restricted to the active language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupJoin {
    pub table: &'static str,
    pub alias: &'static str,
    /// Equality pairs `(primary side, lookup side)` forming the ON clause
    pub on: &'static [(Col, Col)],
    /// Lookup column compared with the request's language id
    pub lang_column: Option<&'static str>,
}

/// Membership table restricting rows to the allowed shops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeMembership {
    pub table: &'static str,
    pub alias: &'static str,
    /// Foreign key pointing at the primary entity
    pub entity_column: &'static str,
    /// Shop id column
    pub scope_column: &'static str,
}

/// Allow-list and layout for one grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDefinition {
    pub name: &'static str,
    pub table: &'static str,
    pub alias: &'static str,
    pub primary_key: &'static str,
    pub projection: &'static [Projected],
    pub joins: &'static [LookupJoin],
    pub scope: Option<ScopeMembership>,
    pub filters: &'static [FilterField],
    pub sorts: &'static [SortField],
}

impl GridDefinition {
    /// Look up a recognized filter field
    pub fn filter(&self, name: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// Look up a sortable field
    pub fn sort(&self, name: &str) -> Option<&SortField> {
        self.sorts.iter().find(|s| s.name == name)
    }

    pub fn primary_key_col(&self) -> Col {
        Col::new(self.alias, self.primary_key)
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.iter().map(|f| f.name)
    }

    pub fn sort_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sorts.iter().map(|s| s.name)
    }
}
