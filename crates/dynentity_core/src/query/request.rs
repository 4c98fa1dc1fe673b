//! Caller-facing query options and the engine-facing fetch request.

use crate::model::schema::EntityDescription;
use crate::query::predicate::Predicate;
use serde::{Deserialize, Serialize};

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortTerm {
    pub attribute: String,
    pub ascending: bool,
}

impl SortTerm {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            ascending: true,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            ascending: false,
        }
    }
}

/// Query options for `EntityStore::query`.
///
/// `Query::default()` matches every record, in store order, without limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub predicate: Predicate,
    /// Applied in sequence order; later terms only break ties.
    pub sort: Vec<SortTerm>,
    /// `0` means unbounded.
    pub limit: u32,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(predicate: Predicate) -> Self {
        Self {
            predicate,
            ..Self::default()
        }
    }

    pub fn sort_by(mut self, term: SortTerm) -> Self {
        self.sort.push(term);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Attributes referenced by predicate and sort terms.
    pub fn referenced_attributes(&self) -> impl Iterator<Item = &str> {
        self.predicate
            .attributes()
            .into_iter()
            .chain(self.sort.iter().map(|term| term.attribute.as_str()))
    }
}

static MATCH_ALL: Predicate = Predicate::All;

/// Validated fetch handed to a `StoreEngine`.
///
/// `entity` carries the attribute list so engines materialize every
/// attribute up front.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub entity: &'a EntityDescription,
    pub predicate: &'a Predicate,
    pub sort: &'a [SortTerm],
    pub limit: Option<u32>,
}

impl<'a> FetchRequest<'a> {
    /// Fetches every record of `entity` in store order.
    pub fn all(entity: &'a EntityDescription) -> Self {
        Self {
            entity,
            predicate: &MATCH_ALL,
            sort: &[],
            limit: None,
        }
    }

    pub fn from_query(entity: &'a EntityDescription, query: &'a Query) -> Self {
        Self {
            entity,
            predicate: &query.predicate,
            sort: &query.sort,
            limit: (query.limit > 0).then_some(query.limit),
        }
    }
}
