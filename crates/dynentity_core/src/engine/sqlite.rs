//! SQLite-backed store engine.
//!
//! # Responsibility
//! - Hold one connection and the pending-change set of one session.
//! - Run fetches and commit pending changes inside a single transaction.
//!
//! # Invariants
//! - Pending changes are invisible to other connections until `save` commits.
//! - A failed `save` rolls the transaction back; nothing becomes durable.

use super::introspect::load_sqlite_schema;
use super::sql::{build_count, build_select};
use super::{SaveOutcome, SchemaProvider, StoreEngine};
use crate::db::{open_db, open_db_in_memory, quote_ident, DbError, DbResult, StoreOptions};
use crate::model::record::{NewRecord, Record, RowId};
use crate::model::schema::{EntityDescription, Schema};
use crate::model::value::Value;
use crate::query::request::FetchRequest;
use log::{debug, error, info};
use rusqlite::{params_from_iter, Connection, Row, Transaction};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug)]
struct PendingDelete {
    entity: String,
    row_id_column: &'static str,
    row_id: RowId,
}

#[derive(Debug, Default)]
struct PendingChanges {
    inserts: Vec<NewRecord>,
    deletes: Vec<PendingDelete>,
}

impl PendingChanges {
    fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.deletes.is_empty()
    }

    fn clear(&mut self) {
        self.inserts.clear();
        self.deletes.clear();
    }
}

/// Store engine over one SQLite connection.
pub struct SqliteEngine {
    conn: Connection,
    pending: PendingChanges,
}

impl SqliteEngine {
    /// Opens a database file.
    pub fn open(path: impl AsRef<Path>, options: &StoreOptions) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path, options)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory(options: &StoreOptions) -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory(options)?))
    }

    /// Wraps an already configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            pending: PendingChanges::default(),
        }
    }

    /// Underlying connection, e.g. for schema setup by the application.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, dropping any pending changes.
    pub fn close(self) -> DbResult<()> {
        let dropped = self.pending.inserts.len() + self.pending.deletes.len();
        match self.conn.close() {
            Ok(()) => {
                info!("event=db_close module=engine status=ok dropped_pending={dropped}");
                Ok(())
            }
            Err((_, err)) => {
                error!("event=db_close module=engine status=error error={err}");
                Err(err.into())
            }
        }
    }
}

impl SchemaProvider for SqliteEngine {
    fn load_schema(&self) -> DbResult<Schema> {
        load_sqlite_schema(&self.conn)
    }
}

impl StoreEngine for SqliteEngine {
    fn fetch(&self, request: &FetchRequest<'_>) -> DbResult<Vec<Record>> {
        let mut binds = Vec::new();
        let sql = build_select(request, &mut binds);
        let attributes: Vec<&str> = request.entity.attributes().collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(request.entity.name(), &attributes, row)?);
        }
        Ok(records)
    }

    fn count(&self, request: &FetchRequest<'_>) -> DbResult<usize> {
        let mut binds = Vec::new();
        let sql = build_count(request, &mut binds);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(binds.iter()), |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| DbError::InvalidData(format!("negative row count {count}")))
    }

    fn stage_insert(&mut self, record: NewRecord) {
        self.pending.inserts.push(record);
    }

    fn stage_delete(&mut self, entity: &EntityDescription, record: &Record) {
        self.pending.deletes.push(PendingDelete {
            entity: entity.name().to_string(),
            row_id_column: entity.row_id_column(),
            row_id: record.row_id,
        });
    }

    fn save(&mut self) -> DbResult<SaveOutcome> {
        if self.pending.is_empty() {
            return Ok(SaveOutcome::default());
        }

        let tx = self.conn.transaction()?;
        let outcome = apply_pending(&tx, &self.pending)?;
        tx.commit()?;

        debug!(
            "event=save module=engine status=ok inserted={} deleted={}",
            outcome.inserted.len(),
            outcome.deleted
        );
        self.pending.clear();
        Ok(outcome)
    }

    fn discard_pending(&mut self) {
        self.pending.clear();
    }

    fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Deletes run before inserts so a batch that replaces rows cannot collide on
/// unique columns.
fn apply_pending(tx: &Transaction<'_>, pending: &PendingChanges) -> DbResult<SaveOutcome> {
    let mut deleted = 0;
    for delete in &pending.deletes {
        deleted += tx.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1;",
                quote_ident(&delete.entity),
                delete.row_id_column
            ),
            [delete.row_id],
        )?;
    }

    let mut inserted = Vec::with_capacity(pending.inserts.len());
    for record in &pending.inserts {
        let row_id = insert_record(tx, record)?;
        inserted.push(read_back(tx, record, row_id)?);
    }

    Ok(SaveOutcome { inserted, deleted })
}

fn insert_record(tx: &Transaction<'_>, record: &NewRecord) -> DbResult<RowId> {
    let table = quote_ident(&record.entity);
    if record.attributes.is_empty() {
        tx.execute(&format!("INSERT INTO {table} DEFAULT VALUES;"), [])?;
        return Ok(tx.last_insert_rowid());
    }

    let columns = record
        .attributes
        .keys()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=record.attributes.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");

    tx.execute(
        &format!("INSERT INTO {table} ({columns}) VALUES ({placeholders});"),
        params_from_iter(record.attributes.values()),
    )?;
    Ok(tx.last_insert_rowid())
}

/// Reloads an inserted row so defaults applied by the store are materialized.
fn read_back(tx: &Transaction<'_>, record: &NewRecord, row_id: RowId) -> DbResult<Record> {
    let entity = record.entity.as_str();
    let mut stmt = tx.prepare(&format!(
        "SELECT * FROM {} WHERE {} = ?1;",
        quote_ident(entity),
        record.row_id_column
    ))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let mut rows = stmt.query([row_id])?;
    let Some(row) = rows.next()? else {
        return Err(DbError::InvalidData(format!(
            "inserted row {row_id} of `{entity}` not found on read-back"
        )));
    };

    let mut attributes = BTreeMap::new();
    for (index, column) in columns.into_iter().enumerate() {
        attributes.insert(column, Value::from(row.get_ref(index)?));
    }
    Ok(Record {
        entity: entity.to_string(),
        row_id,
        attributes,
    })
}

fn parse_record_row(entity: &str, attributes: &[&str], row: &Row<'_>) -> DbResult<Record> {
    let row_id: RowId = row.get(0)?;
    let mut values = BTreeMap::new();
    for (index, attribute) in attributes.iter().enumerate() {
        values.insert((*attribute).to_string(), Value::from(row.get_ref(index + 1)?));
    }
    Ok(Record {
        entity: entity.to_string(),
        row_id,
        attributes: values,
    })
}
