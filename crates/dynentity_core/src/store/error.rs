//! Entity store error taxonomy.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of an entity store operation.
///
/// `UnknownEntity` and `UnknownAttribute` are raised before the engine is
/// touched, so they never leave pending changes behind.
#[derive(Debug)]
pub enum StoreError {
    UnknownEntity(String),
    UnknownAttribute {
        entity: String,
        attribute: String,
    },
    /// The underlying store could not be opened.
    Open(DbError),
    /// The schema provider failed while the store was being opened.
    Schema(DbError),
    /// The engine failed to run a fetch. Distinct from an empty result.
    Fetch {
        entity: String,
        source: DbError,
    },
    /// The durable save failed; the attempted changes were discarded.
    Save {
        entity: String,
        source: DbError,
    },
}

impl StoreError {
    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownEntity(_) => "unknown_entity",
            Self::UnknownAttribute { .. } => "unknown_attribute",
            Self::Open(_) => "open_failed",
            Self::Schema(_) => "schema_load_failed",
            Self::Fetch { .. } => "fetch_failed",
            Self::Save { .. } => "save_failed",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEntity(entity) => write!(f, "unknown entity `{entity}`"),
            Self::UnknownAttribute { entity, attribute } => {
                write!(f, "entity `{entity}` has no attribute `{attribute}`")
            }
            Self::Open(err) => write!(f, "failed to open store: {err}"),
            Self::Schema(err) => write!(f, "failed to load schema: {err}"),
            Self::Fetch { entity, source } => write!(f, "fetch from `{entity}` failed: {source}"),
            Self::Save { entity, source } => write!(f, "save for `{entity}` failed: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) | Self::Schema(err) => Some(err),
            Self::Fetch { source, .. } | Self::Save { source, .. } => Some(source),
            Self::UnknownEntity(_) | Self::UnknownAttribute { .. } => None,
        }
    }
}
