//! SQLite connection bootstrap and engine-level errors.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by the store engine.
//! - Define the transport error shared by engine and schema introspection.
//!
//! # Invariants
//! - Returned connections already carry the pragmas requested by `StoreOptions`.
//! - This layer never creates or migrates tables; the schema is owned by the
//!   application that created the database.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod options;

pub use open::{open_db, open_db_in_memory};
pub use options::StoreOptions;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidData(String),
    InvalidOptions(serde_json::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::InvalidOptions(err) => write!(f, "invalid store options: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidOptions(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Quotes an SQLite identifier so any table/column name is safe in SQL text.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::quote_ident;

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("Person"), "\"Person\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
