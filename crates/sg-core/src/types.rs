//! Common types used throughout shopgrid

/// Primary key type (shop, language, employee and profile ids)
pub type Id = i64;
