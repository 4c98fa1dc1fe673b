//! Schema-introspecting data-access layer over a persistent store.
//!
//! Callers address entities (tables) by name and pass loosely-typed field
//! sets; the layer validates names against the schema loaded at open, maps
//! fields onto known attributes and persists changes with one durable save
//! per operation.

pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod query;
pub mod store;

pub use db::{DbError, DbResult, StoreOptions};
pub use engine::{SaveOutcome, SchemaProvider, SqliteEngine, StoreEngine};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::fields::{
    build_attributes, field_set_from_json, field_sets_from_json, normalize_field_key, FieldSet,
};
pub use model::record::{NewRecord, Record, RowId};
pub use model::schema::{EntityDescription, Schema};
pub use model::value::Value;
pub use query::predicate::Predicate;
pub use query::request::{FetchRequest, Query, SortTerm};
pub use store::{EntityStore, StoreError, StoreResult};

/// Minimal health-check API for integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
