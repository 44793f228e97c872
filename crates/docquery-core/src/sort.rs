//! Sort specifications

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{QueryError, Result};

/// Sort direction, encoded as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_i8(self) -> i8 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.as_f64() {
            Some(n) if n == 1.0 => Some(SortDirection::Ascending),
            Some(n) if n == -1.0 => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

/// Ordered field → direction map. Earlier keys take precedence in
/// multi-key sorts; re-sorting an existing key keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Sort {
    keys: Vec<(String, SortDirection)>,
}

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<SortDirection> {
        self.keys
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, direction)| *direction)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.keys.iter().map(|(k, direction)| (k.as_str(), *direction))
    }

    pub fn set(&mut self, field: impl Into<String>, direction: SortDirection) {
        let field = field.into();
        match self.keys.iter_mut().find(|(k, _)| *k == field) {
            Some((_, existing)) => *existing = direction,
            None => self.keys.push((field, direction)),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.keys
                .iter()
                .map(|(k, direction)| (k.clone(), Value::from(direction.as_i8())))
                .collect(),
        )
    }
}

impl Serialize for Sort {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (field, direction) in &self.keys {
            map.serialize_entry(field, &direction.as_i8())?;
        }
        map.end()
    }
}

impl TryFrom<Map<String, Value>> for Sort {
    type Error = QueryError;

    fn try_from(document: Map<String, Value>) -> Result<Self> {
        let keys = document
            .into_iter()
            .map(|(field, value)| {
                SortDirection::from_value(&value)
                    .map(|direction| (field, direction))
                    .ok_or(QueryError::InvalidSort)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }
}

impl TryFrom<Value> for Sort {
    type Error = QueryError;

    /// `null` reads as an empty sort.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Sort::new()),
            Value::Object(document) => Sort::try_from(document),
            _ => Err(QueryError::InvalidSort),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_set_keeps_first_position() {
        let mut sort = Sort::new();
        sort.set("age", SortDirection::Ascending);
        sort.set("name", SortDirection::Descending);
        sort.set("age", SortDirection::Descending);

        assert_eq!(
            serde_json::to_string(&sort).unwrap(),
            r#"{"age":-1,"name":-1}"#
        );
    }

    #[test]
    fn test_parse_from_json() {
        let sort = Sort::try_from(json!({ "b": -1, "a": 1 })).unwrap();
        assert_eq!(
            sort.iter().collect::<Vec<_>>(),
            vec![("b", SortDirection::Descending), ("a", SortDirection::Ascending)]
        );
    }

    #[test]
    fn test_null_is_empty() {
        assert!(Sort::try_from(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_object_and_bad_direction() {
        assert!(matches!(Sort::try_from(json!(["a"])), Err(QueryError::InvalidSort)));
        assert!(matches!(Sort::try_from(json!({ "a": 2 })), Err(QueryError::InvalidSort)));
        assert!(matches!(Sort::try_from(json!({ "a": "asc" })), Err(QueryError::InvalidSort)));
    }
}
