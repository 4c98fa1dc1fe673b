//! Boolean filters over record attributes.

use crate::model::value::Value;
use serde::{Deserialize, Serialize};

/// Equality/range filter expression evaluated by the store engine.
///
/// `Eq` and `Ne` are null-safe: `Eq(attr, Value::Null)` selects records whose
/// attribute is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every record.
    #[default]
    All,
    Eq(String, Value),
    Ne(String, Value),
    Lt(String, Value),
    Le(String, Value),
    Gt(String, Value),
    Ge(String, Value),
    IsNull(String),
    IsNotNull(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(attribute.into(), value.into())
    }

    pub fn ne(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(attribute.into(), value.into())
    }

    pub fn lt(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt(attribute.into(), value.into())
    }

    pub fn le(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Le(attribute.into(), value.into())
    }

    pub fn gt(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt(attribute.into(), value.into())
    }

    pub fn ge(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ge(attribute.into(), value.into())
    }

    /// Inclusive range `low <= attribute <= high`.
    pub fn between(
        attribute: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        let attribute = attribute.into();
        Self::And(vec![
            Self::Ge(attribute.clone(), low.into()),
            Self::Le(attribute, high.into()),
        ])
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::All => other,
            Self::And(mut terms) => {
                terms.push(other);
                Self::And(terms)
            }
            current => Self::And(vec![current, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Self::Or(mut terms) => {
                terms.push(other);
                Self::Or(terms)
            }
            current => Self::Or(vec![current, other]),
        }
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Every attribute name referenced anywhere in the expression, in
    /// depth-first order (duplicates included).
    pub fn attributes(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_attributes(&mut names);
        names
    }

    fn collect_attributes<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::All => {}
            Self::Eq(attribute, _)
            | Self::Ne(attribute, _)
            | Self::Lt(attribute, _)
            | Self::Le(attribute, _)
            | Self::Gt(attribute, _)
            | Self::Ge(attribute, _)
            | Self::IsNull(attribute)
            | Self::IsNotNull(attribute) => names.push(attribute.as_str()),
            Self::And(terms) | Self::Or(terms) => {
                for term in terms {
                    term.collect_attributes(names);
                }
            }
            Self::Not(inner) => inner.collect_attributes(names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Predicate;

    #[test]
    fn and_with_match_all_collapses() {
        let predicate = Predicate::All.and(Predicate::eq("name", "Ann"));
        assert_eq!(predicate, Predicate::eq("name", "Ann"));
    }

    #[test]
    fn chained_and_stays_flat() {
        let predicate = Predicate::eq("name", "Ann")
            .and(Predicate::gt("age", 18))
            .and(Predicate::IsNotNull("email".to_string()));
        match predicate {
            Predicate::And(terms) => assert_eq!(terms.len(), 3),
            other => panic!("unexpected predicate: {other:?}"),
        }
    }

    #[test]
    fn attributes_walks_nested_terms() {
        let predicate = Predicate::between("age", 18, 65)
            .or(Predicate::eq("name", "Ann").negate());
        assert_eq!(predicate.attributes(), vec!["age", "age", "name"]);
        assert!(Predicate::default().is_match_all());
        assert!(Predicate::All.attributes().is_empty());
    }
}
