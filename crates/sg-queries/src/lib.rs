//! # sg-queries
//!
//! Query composition for admin grids.
//!
//! A grid listing needs two statements built from the same base: the rows
//! for the current page and the total number of matching rows. This crate
//! builds both from a static `GridDefinition`, the request `ScopeContext`
//! and the caller's `SearchCriteria`.
//!
//! ## Structure
//!
//! - `criteria` - Search criteria and request scope
//! - `filters` - Filter kinds, request values and coercion
//! - `sorts` - Sort directions and sortable fields
//! - `definition` - Grid allow-lists and layout
//! - `grids` - Built-in grid definitions
//! - `composer` - List and count query construction
//! - `sql` - SELECT model and Postgres rendering
//! - `values` - Bound parameter values
//!
//! ## Example
//!
//! ```
//! use sg_queries::{grids, FilterValue, QueryComposer, ScopeContext, SearchCriteria, SortDirection};
//!
//! let composer = QueryComposer::new(&grids::EMPLOYEE, "ps_", ScopeContext::new(vec![1], 1));
//! let criteria = SearchCriteria::new()
//!     .filter("lastname", FilterValue::scalar("doe"))
//!     .sort_by("email", SortDirection::Desc)
//!     .paginate(0, 20);
//!
//! let list = composer.build_list_query(&criteria).unwrap();
//! let count = composer.build_count_query(&criteria).unwrap();
//!
//! assert!(list.to_sql().ends_with("LIMIT 20 OFFSET 0"));
//! assert!(count.is_count());
//! ```

pub mod composer;
pub mod criteria;
pub mod definition;
pub mod filters;
pub mod grids;
pub mod sorts;
pub mod sql;
pub mod values;

// Re-exports for convenience
pub use composer::QueryComposer;
pub use criteria::{ScopeContext, SearchCriteria};
pub use definition::GridDefinition;
pub use filters::{FilterKind, FilterValue, RangeValue, Scalar};
pub use sorts::{SortDirection, Sorting};
pub use sql::{Expr, SelectItem, SelectQuery};
pub use values::{ColumnType, SqlValue};
