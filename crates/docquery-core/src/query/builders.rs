//! Comparison, geospatial and pattern conditions
//!
//! Every builder validates its input first and only then touches the filter
//! of the handle it is called on.

use serde_json::{json, Value};
use tracing::{debug, trace};

use super::Query;
use crate::error::{QueryError, Result};
use crate::filter::conditions::*;
use crate::filter::is_truthy;
use crate::pattern::{MatchOptions, Pattern};
use crate::sort::SortDirection;

impl Query {
    /// Set direct value: `filter[field] = value`.
    fn add_value(self, field: String, value: Value) -> Self {
        trace!(%field, "set filter value");
        self.filter.borrow_mut().set_value(field, value);
        self
    }

    /// Set conditional value: `filter[field][condition] = value`.
    fn add_condition(self, field: String, condition: &str, value: Value) -> Self {
        trace!(%field, condition, "set filter condition");
        self.filter
            .borrow_mut()
            .set_condition(field, condition, value);
        self
    }

    fn add_membership(self, field: String, condition: &str, values: Value) -> Result<Self> {
        if !is_truthy(&values) {
            return Err(QueryError::MissingValue);
        }
        let values = match values {
            Value::Array(_) => values,
            single => Value::Array(vec![single]),
        };
        Ok(self.add_condition(field, condition, values))
    }

    fn add_ordering(self, field: String, condition: &str, value: Value) -> Result<Self> {
        if !(value.is_number() || value.is_string()) {
            return Err(QueryError::InvalidComparison);
        }
        Ok(self.add_condition(field, condition, value))
    }

    /// Require `field` to equal `value`, discarding other conditions on it.
    pub fn equal_to(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_value(field.into(), value.into())
    }

    pub fn not_equal_to(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_condition(field.into(), NOT_EQUAL, value.into())
    }

    /// Require `field` to hold at least one of `values`. A single value is
    /// wrapped in a list.
    pub fn contains(self, field: impl Into<String>, values: impl Into<Value>) -> Result<Self> {
        self.add_membership(field.into(), IN, values.into())
    }

    /// Require `field` to hold none of `values`.
    pub fn not_contained_in(
        self,
        field: impl Into<String>,
        values: impl Into<Value>,
    ) -> Result<Self> {
        self.add_membership(field.into(), NOT_IN, values.into())
    }

    /// Require `field` to hold all of `values`.
    pub fn contains_all(self, field: impl Into<String>, values: impl Into<Value>) -> Result<Self> {
        self.add_membership(field.into(), ALL, values.into())
    }

    pub fn greater_than(self, field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        self.add_ordering(field.into(), GREATER_THAN, value.into())
    }

    pub fn greater_than_or_equal_to(
        self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self> {
        self.add_ordering(field.into(), GREATER_THAN_OR_EQUAL, value.into())
    }

    pub fn less_than(self, field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        self.add_ordering(field.into(), LESS_THAN, value.into())
    }

    pub fn less_than_or_equal_to(
        self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self> {
        self.add_ordering(field.into(), LESS_THAN_OR_EQUAL, value.into())
    }

    /// Require `field` to exist (`true`) or be absent (`false`).
    pub fn exists(self, field: impl Into<String>, flag: bool) -> Self {
        self.add_condition(field.into(), EXISTS, Value::Bool(flag))
    }

    /// Require `field % divisor == remainder`.
    pub fn modulo(
        self,
        field: impl Into<String>,
        divisor: impl Into<Value>,
        remainder: impl Into<Value>,
    ) -> Result<Self> {
        let divisor = divisor.into();
        if !divisor.is_number() {
            return Err(QueryError::InvalidModulo { argument: "divisor" });
        }
        let remainder = remainder.into();
        if !remainder.is_number() {
            return Err(QueryError::InvalidModulo {
                argument: "remainder",
            });
        }
        Ok(self.add_condition(field.into(), MOD, json!([divisor, remainder])))
    }

    /// Require `field` to match an anchored pattern.
    ///
    /// Case-insensitive patterns are rejected. Multiline, extended and
    /// dot-matches-all flags are written to `$options` when any is set.
    pub fn matches(
        self,
        field: impl Into<String>,
        pattern: impl Into<Pattern>,
        options: MatchOptions,
    ) -> Result<Self> {
        let pattern = pattern.into();
        if !pattern.is_anchored() {
            return Err(QueryError::UnanchoredPattern);
        }
        let flags = pattern.options(&options)?;

        let field = field.into();
        let query = if flags.is_empty() {
            self
        } else {
            self.add_condition(field.clone(), OPTIONS, Value::String(flags))
        };
        Ok(query.add_condition(field, REGEX, Value::String(pattern.source().to_string())))
    }

    /// Require `field` to be a `[longitude, latitude]` point; results are
    /// ordered nearest first.
    pub fn near(self, field: impl Into<String>, coord: impl Into<Value>) -> Result<Self> {
        let [longitude, latitude] = coordinate(&coord.into(), "coord")?;
        Ok(self.add_condition(field.into(), NEAR_SPHERE, json!([longitude, latitude])))
    }

    /// [`Query::near`], limited to `max_distance` (miles).
    ///
    /// A non-numeric `max_distance` is ignored.
    pub fn near_within(
        self,
        field: impl Into<String>,
        coord: impl Into<Value>,
        max_distance: impl Into<Value>,
    ) -> Result<Self> {
        let field = field.into();
        let query = self.near(field.clone(), coord)?;

        let max_distance = max_distance.into();
        if !max_distance.is_number() {
            debug!(%field, %max_distance, "ignoring non-numeric max distance");
            return Ok(query);
        }
        Ok(query.add_condition(field, MAX_DISTANCE, max_distance))
    }

    /// Require `field` to lie inside the box spanned by two corners.
    pub fn within_box(
        self,
        field: impl Into<String>,
        bottom_left: impl Into<Value>,
        upper_right: impl Into<Value>,
    ) -> Result<Self> {
        let bottom_left = coordinate(&bottom_left.into(), "bottom_left")?;
        let upper_right = coordinate(&upper_right.into(), "upper_right")?;
        Ok(self.add_condition(
            field.into(),
            WITHIN,
            json!({ BOX: [bottom_left, upper_right] }),
        ))
    }

    /// Require `field` to lie inside the polygon described by `coords`.
    pub fn within_polygon(self, field: impl Into<String>, coords: impl Into<Value>) -> Result<Self> {
        let Value::Array(points) = coords.into() else {
            return Err(QueryError::InvalidCoordinate { argument: "coords" });
        };
        if points.is_empty() {
            return Err(QueryError::InvalidCoordinate { argument: "coords" });
        }

        let polygon = points
            .iter()
            .map(|point| match point.as_array() {
                Some(items) if items.len() <= 3 => coordinate(point, "coords"),
                _ => Err(QueryError::InvalidCoordinate { argument: "coords" }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.add_condition(field.into(), WITHIN, json!({ POLYGON: polygon })))
    }

    /// Require the array in `field` to have exactly `size` members.
    pub fn size(self, field: impl Into<String>, size: impl Into<Value>) -> Result<Self> {
        let size = size.into();
        if !size.is_number() {
            return Err(QueryError::InvalidSize);
        }
        Ok(self.add_condition(field.into(), SIZE, size))
    }

    /// Sort by `field`, ascending. Applies to the top-level query.
    pub fn ascending(mut self, field: impl Into<String>) -> Self {
        self.settings_mut().sort.set(field, SortDirection::Ascending);
        self
    }

    /// Sort by `field`, descending. Applies to the top-level query.
    pub fn descending(mut self, field: impl Into<String>) -> Self {
        self.settings_mut().sort.set(field, SortDirection::Descending);
        self
    }
}

/// The numeric first two items of a coordinate array, kept as given so the
/// encoded form matches the input.
fn coordinate(value: &Value, argument: &'static str) -> Result<[Value; 2]> {
    match value.as_array().map(Vec::as_slice) {
        Some([x, y, ..]) if x.is_number() && y.is_number() => Ok([x.clone(), y.clone()]),
        _ => Err(QueryError::InvalidCoordinate { argument }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filter_of(query: &Query) -> Value {
        query.filter().to_value()
    }

    #[test]
    fn test_equal_to_overwrites_conditions() {
        let query = Query::new()
            .greater_than("age", 18)
            .unwrap()
            .equal_to("age", 30);
        assert_eq!(filter_of(&query), json!({ "age": 30 }));
    }

    #[test]
    fn test_not_equal_to() {
        let query = Query::new().not_equal_to("status", "archived");
        assert_eq!(filter_of(&query), json!({ "status": { "$ne": "archived" } }));
    }

    #[test]
    fn test_membership_wraps_scalars() {
        let query = Query::new()
            .contains("tags", "rust")
            .unwrap()
            .not_contained_in("owner", vec!["ALICE", "BOB"])
            .unwrap()
            .contains_all("roles", 7)
            .unwrap();

        assert_eq!(
            filter_of(&query),
            json!({
                "tags": { "$in": ["rust"] },
                "owner": { "$nin": ["ALICE", "BOB"] },
                "roles": { "$all": [7] }
            })
        );
    }

    #[test]
    fn test_membership_requires_value() {
        assert!(matches!(
            Query::new().contains("tags", Value::Null),
            Err(QueryError::MissingValue)
        ));
        assert!(matches!(
            Query::new().not_contained_in("tags", ""),
            Err(QueryError::MissingValue)
        ));
        assert!(matches!(
            Query::new().contains_all("tags", 0),
            Err(QueryError::MissingValue)
        ));
        // An empty list is a value
        assert!(Query::new().contains("tags", Vec::<String>::new()).is_ok());
    }

    #[test]
    fn test_ordering_conditions_merge() {
        let query = Query::new()
            .greater_than_or_equal_to("age", 18)
            .unwrap()
            .less_than("age", 65)
            .unwrap()
            .less_than_or_equal_to("name", "M")
            .unwrap();

        assert_eq!(
            filter_of(&query),
            json!({ "age": { "$gte": 18, "$lt": 65 }, "name": { "$lte": "M" } })
        );
    }

    #[test]
    fn test_ordering_rejects_other_types() {
        assert!(matches!(
            Query::new().greater_than("age", true),
            Err(QueryError::InvalidComparison)
        ));
        assert!(matches!(
            Query::new().less_than("age", json!([1])),
            Err(QueryError::InvalidComparison)
        ));
    }

    #[test]
    fn test_exists() {
        let query = Query::new().exists("email", true).exists("phone", false);
        assert_eq!(
            filter_of(&query),
            json!({ "email": { "$exists": true }, "phone": { "$exists": false } })
        );
    }

    #[test]
    fn test_modulo() {
        let query = Query::new().modulo("count", 4, 0).unwrap();
        assert_eq!(filter_of(&query), json!({ "count": { "$mod": [4, 0] } }));

        assert!(matches!(
            Query::new().modulo("count", "4", 0),
            Err(QueryError::InvalidModulo { argument: "divisor" })
        ));
        assert!(matches!(
            Query::new().modulo("count", 4, Value::Null),
            Err(QueryError::InvalidModulo {
                argument: "remainder"
            })
        ));
    }

    #[test]
    fn test_matches_anchored() {
        let query = Query::new()
            .matches("name", "^Foo", MatchOptions::new())
            .unwrap();
        assert_eq!(filter_of(&query), json!({ "name": { "$regex": "^Foo" } }));

        assert!(matches!(
            Query::new().matches("name", "Foo", MatchOptions::new()),
            Err(QueryError::UnanchoredPattern)
        ));
    }

    #[test]
    fn test_matches_writes_options_first() {
        let query = Query::new()
            .matches(
                "name",
                Pattern::parse("/^Foo/m").unwrap(),
                MatchOptions::new().dot_matches_all(true),
            )
            .unwrap();

        assert_eq!(
            serde_json::to_string(&query.filter()).unwrap(),
            r#"{"name":{"$options":"ms","$regex":"^Foo"}}"#
        );
    }

    #[test]
    fn test_matches_rejects_ignore_case() {
        assert!(matches!(
            Query::new().matches("name", Pattern::parse("/^Foo/i").unwrap(), MatchOptions::new()),
            Err(QueryError::CaseInsensitivePattern)
        ));
    }

    #[test]
    fn test_near() {
        let query = Query::new().near("loc", vec![-71.06, 42.36]).unwrap();
        assert_eq!(
            filter_of(&query),
            json!({ "loc": { "$nearSphere": [-71.06, 42.36] } })
        );

        let query = Query::new()
            .near_within("loc", json!([1, 2, 3]), 10)
            .unwrap();
        assert_eq!(
            serde_json::to_string(&query.filter()).unwrap(),
            r#"{"loc":{"$nearSphere":[1,2],"$maxDistance":10}}"#
        );
    }

    #[test]
    fn test_near_ignores_non_numeric_distance() {
        let query = Query::new().near_within("loc", json!([1, 2]), "far").unwrap();
        assert_eq!(filter_of(&query), json!({ "loc": { "$nearSphere": [1, 2] } }));
    }

    #[test]
    fn test_near_rejects_bad_coordinates() {
        for coord in [json!([1]), json!(["1", 2]), json!({ "x": 1 }), json!(null)] {
            assert!(matches!(
                Query::new().near("loc", coord),
                Err(QueryError::InvalidCoordinate { argument: "coord" })
            ));
        }
    }

    #[test]
    fn test_within_box() {
        let query = Query::new()
            .within_box("loc", json!([0, 0]), json!([10, 10]))
            .unwrap();
        assert_eq!(
            filter_of(&query),
            json!({ "loc": { "$within": { "$box": [[0, 0], [10, 10]] } } })
        );

        assert!(matches!(
            Query::new().within_box("loc", json!([0]), json!([10, 10])),
            Err(QueryError::InvalidCoordinate {
                argument: "bottom_left"
            })
        ));
        assert!(matches!(
            Query::new().within_box("loc", json!([0, 0]), json!("10,10")),
            Err(QueryError::InvalidCoordinate {
                argument: "upper_right"
            })
        ));
    }

    #[test]
    fn test_within_polygon() {
        let query = Query::new()
            .within_polygon("loc", json!([[0, 0], [3, 6, 9], [6, 0]]))
            .unwrap();
        assert_eq!(
            filter_of(&query),
            json!({ "loc": { "$within": { "$polygon": [[0, 0], [3, 6], [6, 0]] } } })
        );
    }

    #[test]
    fn test_within_polygon_rejects_bad_input() {
        for coords in [
            json!([]),
            json!([[0, 0, 0, 0]]),
            json!([[0, 0], [1]]),
            json!([[0, "a"]]),
            json!({ "points": [] }),
        ] {
            assert!(matches!(
                Query::new().within_polygon("loc", coords),
                Err(QueryError::InvalidCoordinate { argument: "coords" })
            ));
        }
    }

    #[test]
    fn test_size() {
        let query = Query::new().size("tags", 3).unwrap();
        assert_eq!(filter_of(&query), json!({ "tags": { "$size": 3 } }));
        assert!(matches!(
            Query::new().size("tags", "3"),
            Err(QueryError::InvalidSize)
        ));
    }

    #[test]
    fn test_sort_order_is_insertion_order() {
        let query = Query::new().ascending("name").descending("age").ascending("name");
        assert_eq!(
            serde_json::to_string(query.sort()).unwrap(),
            r#"{"name":1,"age":-1}"#
        );
    }
}
