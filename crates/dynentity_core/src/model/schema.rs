//! Introspected entity schema.
//!
//! # Invariants
//! - Entity and attribute names are matched exactly (case-sensitive).
//! - A schema never changes after construction; a store that needs a newer
//!   schema must be reopened.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Names SQLite accepts for the implicit row identity, in preference order.
pub const ROW_ID_ALIASES: [&str; 3] = ["rowid", "_rowid_", "oid"];

/// Name and attribute set of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDescription {
    name: String,
    attributes: BTreeSet<String>,
    row_id_column: &'static str,
}

impl EntityDescription {
    pub fn new<I, S>(name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes: BTreeSet<String> = attributes.into_iter().map(Into::into).collect();
        let row_id_column = free_row_id_alias(&attributes).unwrap_or(ROW_ID_ALIASES[0]);
        Self {
            name: name.into(),
            attributes,
            row_id_column,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name that addresses the row identity: the first of `ROW_ID_ALIASES`
    /// not shadowed by a declared attribute.
    pub fn row_id_column(&self) -> &'static str {
        self.row_id_column
    }

    /// Returns whether some row identity alias is left unshadowed.
    pub fn has_addressable_rows(&self) -> bool {
        free_row_id_alias(&self.attributes).is_some()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }
}

/// SQLite matches these names case-insensitively, so `ROWID` shadows too.
fn free_row_id_alias(attributes: &BTreeSet<String>) -> Option<&'static str> {
    ROW_ID_ALIASES.into_iter().find(|alias| {
        !attributes
            .iter()
            .any(|attribute| attribute.eq_ignore_ascii_case(alias))
    })
}

/// Immutable set of known entities keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    entities: BTreeMap<String, EntityDescription>,
}

impl Schema {
    /// Builds a schema; a later description with a duplicate name replaces
    /// the earlier one.
    pub fn new(entities: impl IntoIterator<Item = EntityDescription>) -> Self {
        Self {
            entities: entities
                .into_iter()
                .map(|entity| (entity.name.clone(), entity))
                .collect(),
        }
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDescription> {
        self.entities.get(name)
    }

    pub fn contains_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Entity names in ascending order.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDescription> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
