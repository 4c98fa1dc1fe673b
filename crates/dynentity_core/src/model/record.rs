//! Materialized and pending entity records.

use crate::model::schema::EntityDescription;
use crate::model::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Store-assigned row identity of a persisted record.
pub type RowId = i64;

/// A fully materialized, persisted record of one entity.
///
/// Every schema attribute of the entity is present in `attributes`; unset
/// attributes hold `Value::Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    pub row_id: RowId,
    pub attributes: BTreeMap<String, Value>,
}

impl Record {
    /// Returns the value of `attribute`, or `None` when the entity has no such
    /// attribute.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Returns whether `attribute` holds a non-null value.
    pub fn is_set(&self, attribute: &str) -> bool {
        self.get(attribute).is_some_and(|value| !value.is_null())
    }

    /// Iterates over attributes holding non-null values.
    pub fn set_attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// An in-memory record staged for insertion but not yet durable.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub entity: String,
    /// Row identity name of `entity`, used to read the record back.
    pub row_id_column: &'static str,
    /// Only the attributes that were assigned; everything else is left to the
    /// store's column defaults.
    pub attributes: BTreeMap<String, Value>,
}

impl NewRecord {
    pub fn new(entity: &EntityDescription, attributes: BTreeMap<String, Value>) -> Self {
        Self {
            entity: entity.name().to_string(),
            row_id_column: entity.row_id_column(),
            attributes,
        }
    }
}
