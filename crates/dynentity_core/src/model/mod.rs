//! Dynamic data model shared by the store facade and its engines.
//!
//! # Responsibility
//! - Define loosely-typed values, records and the introspected schema.
//! - Implement the field-mapping rule that turns raw caller input into
//!   attributes of a known entity.
//!
//! # Invariants
//! - A `Schema` is immutable once built.
//! - Record attributes are always named by schema attribute names.

pub mod fields;
pub mod record;
pub mod schema;
pub mod value;
