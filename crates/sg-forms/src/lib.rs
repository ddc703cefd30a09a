//! # sg-forms
//!
//! Form policies for the back office.
//!
//! Some forms validate a different set of fields depending on what was
//! submitted. Each policy here is a pure function from the submitted state
//! to the constraint group that applies, plus a `Contract` running only
//! that group's checks.

pub mod base;
pub mod specific_price;
pub mod tax_inclusion;

pub use base::*;
