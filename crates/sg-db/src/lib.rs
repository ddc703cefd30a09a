//! # sg-db
//!
//! Datastore layer for shopgrid.
//!
//! This crate executes the queries composed by `sg-queries`:
//!
//! - Connection pool management
//! - The `Datastore` trait, with a PostgreSQL and an in-memory implementation
//! - `GridListing`, which runs the count and page queries of a grid request
//!
//! ## Example
//!
//! ```ignore
//! use sg_core::config::AppConfig;
//! use sg_db::{Database, GridListing, PgDatastore};
//! use sg_queries::{grids, QueryComposer, ScopeContext, SearchCriteria};
//!
//! let config = AppConfig::from_env()?;
//! let db = Database::connect(&config.database).await?;
//! let listing = GridListing::new(PgDatastore::new(db.pool().clone()));
//!
//! let composer = QueryComposer::new(&grids::EMPLOYEE, "ps_", ScopeContext::new(vec![1], 1));
//! let page = listing.list(&composer, &SearchCriteria::new().paginate(0, 50)).await?;
//! ```

pub mod datastore;
pub mod error;
pub mod listing;
pub mod memory;
pub mod pool;

// Re-exports
pub use datastore::{Datastore, PgDatastore};
pub use error::{DatastoreError, DatastoreResult, ListingError};
pub use listing::GridListing;
pub use memory::MemoryDatastore;
pub use pool::{Database, PoolStats};
