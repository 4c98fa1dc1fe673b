//! Dynamic entity store facade.
//!
//! # Responsibility
//! - Validate entity and attribute names against the schema loaded at open.
//! - Turn loosely-typed field sets into pending records and persist them with
//!   one durable save per operation.
//! - Report fetch and save failures as errors distinct from empty results.
//!
//! # Invariants
//! - Unknown entities are rejected before the engine is touched.
//! - `insert_many` and `delete_all` issue exactly one save, whatever the batch
//!   size.
//! - After a failed save the engine holds no pending changes.
//!
//! # See also
//! - `crate::model::fields` for the field-mapping rule.

mod error;

pub use error::{StoreError, StoreResult};

use crate::db::{DbError, StoreOptions};
use crate::engine::{SaveOutcome, SchemaProvider, SqliteEngine, StoreEngine};
use crate::model::fields::{build_attributes, FieldSet};
use crate::model::record::{NewRecord, Record};
use crate::model::schema::{EntityDescription, Schema};
use crate::query::predicate::Predicate;
use crate::query::request::{FetchRequest, Query};
use log::{debug, error, info, warn};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// One logical session over a store engine and the schema it was opened with.
///
/// Mutating operations take `&mut self`; share a store across threads only
/// behind external mutual exclusion.
pub struct EntityStore<E: StoreEngine> {
    engine: E,
    schema: Schema,
    session_id: Uuid,
}

impl<E: StoreEngine> EntityStore<E> {
    /// Creates a store with a schema that is already known.
    pub fn with_schema(engine: E, schema: Schema) -> Self {
        let session_id = Uuid::new_v4();
        info!(
            "event=store_open module=store status=ok session={} entities={}",
            session_id,
            schema.len()
        );
        Self {
            engine,
            schema,
            session_id,
        }
    }

    /// Creates a store, loading the schema once from `provider`.
    pub fn open(engine: E, provider: &impl SchemaProvider) -> StoreResult<Self> {
        let schema = provider.load_schema().map_err(|err| {
            error!(
                "event=store_open module=store status=error error_code=schema_load_failed error={err}"
            );
            StoreError::Schema(err)
        })?;
        Ok(Self::with_schema(engine, schema))
    }

    /// Creates a store from an engine that also describes its own schema.
    pub fn introspect(engine: E) -> StoreResult<Self>
    where
        E: SchemaProvider,
    {
        let schema = engine.load_schema().map_err(|err| {
            error!(
                "event=store_open module=store status=error error_code=schema_load_failed error={err}"
            );
            StoreError::Schema(err)
        })?;
        Ok(Self::with_schema(engine, schema))
    }

    /// Ends the session and hands the engine back.
    pub fn close(self) -> E {
        info!(
            "event=store_close module=store status=ok session={}",
            self.session_id
        );
        self.engine
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.schema.entity_names()
    }

    pub fn contains_entity(&self, entity: &str) -> bool {
        self.schema.contains_entity(entity)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Fetches records of `entity` matching `query`.
    ///
    /// Returns `Ok(vec![])` when nothing matches; engine failures surface as
    /// `StoreError::Fetch`.
    pub fn query(&self, entity: &str, query: &Query) -> StoreResult<Vec<Record>> {
        let started_at = Instant::now();
        let description = self.describe(entity, "entity_query")?;
        self.check_attributes(description, query.referenced_attributes(), "entity_query")?;

        let request = FetchRequest::from_query(description, query);
        let records = self.fetch(&request, "entity_query")?;
        debug!(
            "event=entity_query module=store status=ok session={} entity={} rows={} sort_terms={} limit={} duration_ms={}",
            self.session_id,
            entity,
            records.len(),
            query.sort.len(),
            query.limit,
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    /// Counts records of `entity` matching `predicate`.
    pub fn count(&self, entity: &str, predicate: &Predicate) -> StoreResult<usize> {
        let description = self.describe(entity, "entity_count")?;
        self.check_attributes(description, predicate.attributes(), "entity_count")?;

        let request = FetchRequest {
            predicate,
            ..FetchRequest::all(description)
        };
        self.engine.count(&request).map_err(|source| {
            error!(
                "event=entity_count module=store status=error session={} entity={} error_code=fetch_failed error={}",
                self.session_id, entity, source
            );
            StoreError::Fetch {
                entity: entity.to_string(),
                source,
            }
        })
    }

    /// Builds one record from `fields` and saves it durably.
    pub fn insert_one(&mut self, entity: &str, fields: &FieldSet) -> StoreResult<Record> {
        let started_at = Instant::now();
        let description = self.describe(entity, "entity_insert")?;
        let record = NewRecord::new(description, build_attributes(description, fields));
        let assigned = record.attributes.len();
        self.engine.stage_insert(record);

        let mut outcome = self.save_or_discard(entity, "entity_insert")?;
        self.project_onto_schema(&mut outcome.inserted);
        let Some(record) = outcome.inserted.into_iter().next() else {
            return Err(self.save_failed(
                entity,
                "entity_insert",
                DbError::InvalidData("save reported no inserted record".to_string()),
            ));
        };

        info!(
            "event=entity_insert module=store status=ok session={} entity={} row_id={} assigned={} duration_ms={}",
            self.session_id,
            entity,
            record.row_id,
            assigned,
            started_at.elapsed().as_millis()
        );
        Ok(record)
    }

    /// Builds one record per field set, in order, and saves them all with a
    /// single durable save.
    ///
    /// Either every record becomes durable or none does.
    pub fn insert_many(
        &mut self,
        entity: &str,
        field_sets: &[FieldSet],
    ) -> StoreResult<Vec<Record>> {
        let started_at = Instant::now();
        let description = self.describe(entity, "entity_insert_batch")?;
        let pending: Vec<NewRecord> = field_sets
            .iter()
            .map(|fields| NewRecord::new(description, build_attributes(description, fields)))
            .collect();
        for record in pending {
            self.engine.stage_insert(record);
        }

        let mut outcome = self.save_or_discard(entity, "entity_insert_batch")?;
        self.project_onto_schema(&mut outcome.inserted);
        info!(
            "event=entity_insert_batch module=store status=ok session={} entity={} rows={} duration_ms={}",
            self.session_id,
            entity,
            outcome.inserted.len(),
            started_at.elapsed().as_millis()
        );
        Ok(outcome.inserted)
    }

    /// Deletes every record of `entity` with a single durable save.
    ///
    /// Returns the number of deleted records.
    pub fn delete_all(&mut self, entity: &str) -> StoreResult<usize> {
        let started_at = Instant::now();
        let description = &self.describe(entity, "entity_delete_all")?.clone();
        let records = self.fetch(&FetchRequest::all(description), "entity_delete_all")?;
        for record in &records {
            self.engine.stage_delete(description, record);
        }

        let outcome = self.save_or_discard(entity, "entity_delete_all")?;
        info!(
            "event=entity_delete_all module=store status=ok session={} entity={} deleted={} duration_ms={}",
            self.session_id,
            entity,
            outcome.deleted,
            started_at.elapsed().as_millis()
        );
        Ok(outcome.deleted)
    }

    fn describe(&self, entity: &str, event: &str) -> StoreResult<&EntityDescription> {
        self.schema.entity(entity).ok_or_else(|| {
            warn!(
                "event={} module=store status=error session={} entity={} error_code=unknown_entity",
                event, self.session_id, entity
            );
            StoreError::UnknownEntity(entity.to_string())
        })
    }

    fn check_attributes<'a>(
        &self,
        description: &EntityDescription,
        attributes: impl IntoIterator<Item = &'a str>,
        event: &str,
    ) -> StoreResult<()> {
        for attribute in attributes {
            if !description.has_attribute(attribute) {
                warn!(
                    "event={} module=store status=error session={} entity={} error_code=unknown_attribute",
                    event,
                    self.session_id,
                    description.name()
                );
                return Err(StoreError::UnknownAttribute {
                    entity: description.name().to_string(),
                    attribute: attribute.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Engines may return columns the schema does not expose; keep inserted
    /// records shaped exactly like fetched ones.
    fn project_onto_schema(&self, records: &mut [Record]) {
        for record in records {
            if let Some(description) = self.schema.entity(&record.entity) {
                record
                    .attributes
                    .retain(|attribute, _| description.has_attribute(attribute));
            }
        }
    }

    fn fetch(&self, request: &FetchRequest<'_>, event: &str) -> StoreResult<Vec<Record>> {
        self.engine.fetch(request).map_err(|source| {
            error!(
                "event={} module=store status=error session={} entity={} error_code=fetch_failed error={}",
                event,
                self.session_id,
                request.entity.name(),
                source
            );
            StoreError::Fetch {
                entity: request.entity.name().to_string(),
                source,
            }
        })
    }

    /// Saves pending changes; on failure discards them so the next operation
    /// starts from the last durable state.
    fn save_or_discard(&mut self, entity: &str, event: &str) -> StoreResult<SaveOutcome> {
        match self.engine.save() {
            Ok(outcome) => Ok(outcome),
            Err(source) => {
                self.engine.discard_pending();
                info!(
                    "event=pending_discard module=store status=ok session={} entity={}",
                    self.session_id, entity
                );
                Err(self.save_failed(entity, event, source))
            }
        }
    }

    fn save_failed(&self, entity: &str, event: &str, source: DbError) -> StoreError {
        error!(
            "event={} module=store status=error session={} entity={} error_code=save_failed error={}",
            event, self.session_id, entity, source
        );
        StoreError::Save {
            entity: entity.to_string(),
            source,
        }
    }
}

impl EntityStore<SqliteEngine> {
    /// Opens a SQLite database file and introspects its schema.
    pub fn open_sqlite(path: impl AsRef<Path>, options: &StoreOptions) -> StoreResult<Self> {
        let engine = SqliteEngine::open(path, options).map_err(StoreError::Open)?;
        Self::introspect(engine)
    }

    /// Opens a private in-memory SQLite database, runs `schema_sql` to declare
    /// its tables and introspects the result.
    pub fn open_sqlite_in_memory(schema_sql: &str, options: &StoreOptions) -> StoreResult<Self> {
        let engine = SqliteEngine::open_in_memory(options).map_err(StoreError::Open)?;
        if let Err(err) = engine.connection().execute_batch(schema_sql) {
            error!(
                "event=store_open module=store status=error mode=memory error_code=schema_declare_failed error={err}"
            );
            return Err(StoreError::Open(err.into()));
        }
        Self::introspect(engine)
    }
}
