//! # sg-core
//!
//! Core types, errors, and configuration for shopgrid.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - The grid error taxonomy and validation error collection
//! - Identifier types
//! - Page arithmetic and paginated results
//! - Configuration types

pub mod error;
pub mod types;
pub mod pagination;
pub mod config;

pub use error::*;
pub use types::*;
pub use pagination::*;
