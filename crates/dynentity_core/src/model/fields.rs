//! Field-set to attribute mapping used by every insert path.
//!
//! # Responsibility
//! - Normalize raw field labels (`"Name"` -> `"name"`).
//! - Drop fields the entity does not know and fields carrying `Null`.
//!
//! # Invariants
//! - Only the first character of a label is lower-cased; the rest is kept
//!   verbatim, so `"FirstName"` maps to `"firstName"`, never `"firstname"`.
//! - Mapping never fails: unknown or null fields are skipped silently.

use crate::model::schema::EntityDescription;
use crate::model::value::Value;
use std::collections::BTreeMap;

/// Raw label -> value seed for one new record.
pub type FieldSet = BTreeMap<String, Value>;

/// Lower-cases the first character of `key` and keeps the rest unchanged.
pub fn normalize_field_key(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Maps `fields` onto the attributes of `entity`.
///
/// Fields are visited in key order, so when two labels normalize to the same
/// attribute (`"Name"` and `"name"`) the later key in that order wins.
pub fn build_attributes(entity: &EntityDescription, fields: &FieldSet) -> BTreeMap<String, Value> {
    let mut attributes = BTreeMap::new();
    for (key, value) in fields {
        if value.is_null() {
            continue;
        }
        let attribute = normalize_field_key(key);
        if !entity.has_attribute(&attribute) {
            continue;
        }
        attributes.insert(attribute, value.clone());
    }
    attributes
}

/// Builds a field set from a JSON object; returns `None` for any other JSON
/// shape.
pub fn field_set_from_json(value: serde_json::Value) -> Option<FieldSet> {
    match value {
        serde_json::Value::Object(map) => Some(
            map.into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect(),
        ),
        _ => None,
    }
}

/// Builds one field set per element of a JSON array of objects.
///
/// Returns `None` when `value` is not an array or any element is not an
/// object, so a malformed payload is rejected as a whole.
pub fn field_sets_from_json(value: serde_json::Value) -> Option<Vec<FieldSet>> {
    match value {
        serde_json::Value::Array(items) => items.into_iter().map(field_set_from_json).collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        build_attributes, field_set_from_json, field_sets_from_json, normalize_field_key, FieldSet,
    };
    use crate::model::schema::EntityDescription;
    use crate::model::value::Value;
    use serde_json::json;

    fn person() -> EntityDescription {
        EntityDescription::new("Person", ["name", "age", "firstName"])
    }

    #[test]
    fn normalize_only_touches_first_character() {
        assert_eq!(normalize_field_key("Name"), "name");
        assert_eq!(normalize_field_key("FirstName"), "firstName");
        assert_eq!(normalize_field_key("AGE"), "aGE");
        assert_eq!(normalize_field_key("name"), "name");
        assert_eq!(normalize_field_key(""), "");
        assert_eq!(normalize_field_key("Émile"), "émile");
    }

    #[test]
    fn unknown_and_null_fields_are_dropped() {
        let fields = FieldSet::from([
            ("Name".to_string(), Value::from("Ann")),
            ("Age".to_string(), Value::Null),
            ("Nickname".to_string(), Value::from("A")),
        ]);

        let attributes = build_attributes(&person(), &fields);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get("name"), Some(&Value::from("Ann")));
    }

    #[test]
    fn normalization_is_not_general_case_insensitivity() {
        let fields = FieldSet::from([
            ("FIRSTNAME".to_string(), Value::from("x")),
            ("Firstname".to_string(), Value::from("y")),
            ("FirstName".to_string(), Value::from("Ann")),
        ]);

        let attributes = build_attributes(&person(), &fields);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get("firstName"), Some(&Value::from("Ann")));
    }

    #[test]
    fn colliding_labels_resolve_to_later_key() {
        let fields = FieldSet::from([
            ("Name".to_string(), Value::from("upper")),
            ("name".to_string(), Value::from("lower")),
        ]);

        let attributes = build_attributes(&person(), &fields);
        assert_eq!(attributes.get("name"), Some(&Value::from("lower")));
    }

    #[test]
    fn json_payload_converts_to_field_sets() {
        let single = field_set_from_json(json!({"Name": "Ann", "Age": 30, "Extra": null})).unwrap();
        assert_eq!(single.get("Age"), Some(&Value::Integer(30)));
        assert_eq!(single.get("Extra"), Some(&Value::Null));

        let batch = field_sets_from_json(json!([{"Name": "Ann"}, {"Name": "Bob"}])).unwrap();
        assert_eq!(batch.len(), 2);

        assert!(field_set_from_json(json!([1, 2])).is_none());
        assert!(field_sets_from_json(json!([{"Name": "Ann"}, 3])).is_none());
        assert!(field_sets_from_json(json!({"Name": "Ann"})).is_none());
    }
}
