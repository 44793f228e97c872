//! Filter documents
//!
//! A [`Filter`] maps field names (or one of the logical operator keys
//! `$and`, `$or`, `$nor`) to a [`Clause`]. Entries keep insertion order, and
//! overwriting a key keeps its original position, so the encoded document is
//! byte-stable for a given sequence of builder calls.
//!
//! ```rust
//! use docquery_core::filter::Filter;
//! use serde_json::json;
//!
//! let filter = Filter::try_from(json!({ "age": { "$gt": 21 }, "active": true })).unwrap();
//! assert_eq!(filter.len(), 2);
//! assert_eq!(serde_json::to_string(&filter).unwrap(), r#"{"age":{"$gt":21},"active":true}"#);
//! ```

pub mod conditions;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{QueryError, Result};

/// A filter that may be referenced from several places in a filter tree.
///
/// The precedence engine stores a branch's filter both in the branch handle
/// and inside its parent's logical list, so edits made through the branch
/// show up in the parent's tree.
pub type SharedFilter = Rc<RefCell<Filter>>;

pub(crate) fn shared(filter: Filter) -> SharedFilter {
    Rc::new(RefCell::new(filter))
}

/// Logical combinators, ordered here from tightest to loosest binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Nor,
    Or,
}

impl LogicalOperator {
    /// The filter key this operator is stored under.
    pub fn key(self) -> &'static str {
        match self {
            LogicalOperator::And => "$and",
            LogicalOperator::Nor => "$nor",
            LogicalOperator::Or => "$or",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$and" => Some(LogicalOperator::And),
            "$nor" => Some(LogicalOperator::Nor),
            "$or" => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The value stored under one filter key.
#[derive(Debug, PartialEq)]
pub enum Clause {
    /// Direct equality against a scalar, array or document
    Value(Value),
    /// `{operator: operand}` conditions on a single field
    Conditions(Map<String, Value>),
    /// Nested filters combined by a logical operator
    Logical(Vec<SharedFilter>),
}

impl Clause {
    /// Conditions of this clause when it is (or reads as) a condition map.
    ///
    /// Direct object values count, matching how the clause is encoded.
    pub fn as_conditions(&self) -> Option<&Map<String, Value>> {
        match self {
            Clause::Conditions(conditions) => Some(conditions),
            Clause::Value(Value::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Clause::Value(value) => value.clone(),
            Clause::Conditions(conditions) => Value::Object(conditions.clone()),
            Clause::Logical(filters) => {
                Value::Array(filters.iter().map(|f| f.borrow().to_value()).collect())
            }
        }
    }
}

impl Clone for Clause {
    /// Deep copy: nested logical filters are copied, never shared.
    fn clone(&self) -> Self {
        match self {
            Clause::Value(value) => Clause::Value(value.clone()),
            Clause::Conditions(conditions) => Clause::Conditions(conditions.clone()),
            Clause::Logical(filters) => Clause::Logical(
                filters
                    .iter()
                    .map(|f| shared(f.borrow().clone()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Clause {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Clause::Value(value) => value.serialize(serializer),
            Clause::Conditions(conditions) => conditions.serialize(serializer),
            Clause::Logical(filters) => serializer.collect_seq(filters.iter().map(|f| &**f)),
        }
    }
}

/// An ordered filter document.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Filter {
    entries: Vec<(String, Clause)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Clause> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, clause)| clause)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Clause)> {
        self.entries.iter().map(|(k, clause)| (k.as_str(), clause))
    }

    /// Render the filter as a JSON document.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, clause)| (k.clone(), clause.to_value()))
                .collect(),
        )
    }

    /// Replace whatever is stored under `key`.
    pub(crate) fn set_clause(&mut self, key: String, clause: Clause) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = clause,
            None => self.entries.push((key, clause)),
        }
    }

    /// Direct equality: `filter[field] = value`.
    pub(crate) fn set_value(&mut self, field: String, value: Value) {
        self.set_clause(field, Clause::Value(value));
    }

    /// `filter[field][condition] = value`, merging with conditions already
    /// present on the field.
    ///
    /// A direct object value is promoted to a condition map; any other
    /// direct value or logical list is replaced.
    pub(crate) fn set_condition(&mut self, field: String, condition: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == field) {
            Some((_, clause)) => {
                let mut conditions = match std::mem::replace(clause, Clause::Value(Value::Null)) {
                    Clause::Conditions(conditions) => conditions,
                    Clause::Value(Value::Object(object)) => object,
                    Clause::Value(_) | Clause::Logical(_) => Map::new(),
                };
                conditions.insert(condition.to_string(), value);
                *clause = Clause::Conditions(conditions);
            }
            None => {
                let mut conditions = Map::new();
                conditions.insert(condition.to_string(), value);
                self.entries.push((field, Clause::Conditions(conditions)));
            }
        }
    }

    /// Move every entry out, leaving this filter empty.
    pub(crate) fn take(&mut self) -> Filter {
        std::mem::take(self)
    }
}

impl Clone for Filter {
    /// Deep copy. Shared branch filters inside the tree are copied too, so the
    /// clone never observes later edits made through a branch.
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, clause) in &self.entries {
            map.serialize_entry(key, clause)?;
        }
        map.end()
    }
}

impl TryFrom<Map<String, Value>> for Filter {
    type Error = QueryError;

    fn try_from(document: Map<String, Value>) -> Result<Self> {
        let mut entries = Vec::with_capacity(document.len());
        for (key, value) in document {
            let clause = match (LogicalOperator::from_key(&key), value) {
                (Some(_), Value::Array(items)) if items.iter().all(Value::is_object) => {
                    let filters = items
                        .into_iter()
                        .map(|item| Filter::try_from(item).map(shared))
                        .collect::<Result<Vec<_>>>()?;
                    Clause::Logical(filters)
                }
                (_, Value::Object(conditions)) => Clause::Conditions(conditions),
                (_, value) => Clause::Value(value),
            };
            entries.push((key, clause));
        }
        Ok(Self { entries })
    }
}

impl TryFrom<Value> for Filter {
    type Error = QueryError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(document) => Filter::try_from(document),
            other => Err(QueryError::InvalidFilter(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

/// JavaScript truthiness, which the wire format's consumers rely on:
/// `null`, `false`, `0` and `""` are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
