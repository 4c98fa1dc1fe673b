//! Schema introspection for SQLite databases.
//!
//! # Invariants
//! - Only ordinary rowid tables of the `main` schema are exposed as entities.
//!   SQLite internals, views, virtual tables and their shadow tables, and
//!   `WITHOUT ROWID` tables are skipped because records are addressed by row id.
//! - A table whose columns shadow every row id alias is skipped too.
//! - Attribute names are reported exactly as declared.

use crate::db::{quote_ident, DbResult};
use crate::model::schema::{EntityDescription, Schema};
use log::{debug, error, info};
use rusqlite::Connection;
use std::time::Instant;

struct TableListEntry {
    name: String,
    /// `table`, `view`, `virtual` or `shadow`.
    kind: String,
    without_rowid: bool,
}

impl TableListEntry {
    fn is_rowid_user_table(&self) -> bool {
        self.kind == "table" && !self.without_rowid && !self.name.starts_with("sqlite_")
    }
}

/// Reads the entity schema of the database behind `conn`.
///
/// # Side effects
/// - Emits a `schema_load` logging event with entity count and duration.
pub fn load_sqlite_schema(conn: &Connection) -> DbResult<Schema> {
    let started_at = Instant::now();
    match read_schema(conn) {
        Ok(schema) => {
            info!(
                "event=schema_load module=engine status=ok entities={} duration_ms={}",
                schema.len(),
                started_at.elapsed().as_millis()
            );
            Ok(schema)
        }
        Err(err) => {
            error!(
                "event=schema_load module=engine status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn read_schema(conn: &Connection) -> DbResult<Schema> {
    let mut stmt = conn.prepare("PRAGMA main.table_list;")?;
    let tables = stmt
        .query_map([], |row| {
            Ok(TableListEntry {
                name: row.get("name")?,
                kind: row.get("type")?,
                without_rowid: row.get::<_, i64>("wr")? != 0,
            })
        })?
        .filter_map(|entry| match entry {
            Ok(entry) if entry.is_rowid_user_table() => Some(Ok(entry.name)),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut entities = Vec::with_capacity(tables.len());
    for name in tables {
        let columns = table_columns(conn, &name)?;
        let entity = EntityDescription::new(name, columns);
        if !entity.has_addressable_rows() {
            debug!(
                "event=schema_load module=engine status=skipped entity={} reason=row_id_shadowed",
                entity.name()
            );
            continue;
        }
        entities.push(entity);
    }

    Ok(Schema::new(entities))
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}
