//! Store engine contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define the primitives the entity store needs from a persistent store:
//!   fetch, count, staged insert, staged delete, atomic save, discard.
//! - Define how the schema is supplied at store construction.
//!
//! # Invariants
//! - `save` is all-or-nothing: either every pending change becomes durable or
//!   none does.
//! - A failed `save` leaves pending state untouched; callers decide whether to
//!   discard it.

use crate::db::DbResult;
use crate::model::record::{NewRecord, Record};
use crate::model::schema::{EntityDescription, Schema};
use crate::query::request::FetchRequest;

mod introspect;
mod sql;
mod sqlite;

pub use introspect::load_sqlite_schema;
pub use sqlite::SqliteEngine;

/// Result of one successful durable save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOutcome {
    /// Persisted records for staged inserts, in staging order.
    pub inserted: Vec<Record>,
    /// Number of records removed by staged deletes.
    pub deleted: usize,
}

/// Session over a persistent store with a single pending-change set.
///
/// Implementations are bound to one caller at a time; mutating primitives take
/// `&mut self`.
pub trait StoreEngine {
    /// Runs a fetch and returns fully materialized records.
    fn fetch(&self, request: &FetchRequest<'_>) -> DbResult<Vec<Record>>;
    /// Counts the records a fetch would return, ignoring sort and limit,
    /// without materializing them.
    fn count(&self, request: &FetchRequest<'_>) -> DbResult<usize>;
    /// Stages a new record in the pending state without persisting it.
    fn stage_insert(&mut self, record: NewRecord);
    /// Stages removal of a persisted record of `entity`.
    fn stage_delete(&mut self, entity: &EntityDescription, record: &Record);
    /// Commits every pending change atomically.
    fn save(&mut self) -> DbResult<SaveOutcome>;
    /// Drops all pending changes, reverting to the last durable state.
    fn discard_pending(&mut self);
    fn has_pending_changes(&self) -> bool;
}

/// Supplies the entity schema once, when a store is constructed.
pub trait SchemaProvider {
    fn load_schema(&self) -> DbResult<Schema>;
}

/// A prebuilt schema is its own provider.
impl SchemaProvider for Schema {
    fn load_schema(&self) -> DbResult<Schema> {
        Ok(self.clone())
    }
}
