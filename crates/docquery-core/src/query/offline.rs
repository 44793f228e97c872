//! Offline support analysis

use super::Query;
use crate::filter::conditions::OFFLINE_UNSUPPORTED;
use crate::filter::{is_truthy, Clause};

impl Query {
    /// Whether this query can be evaluated against a local copy of the data.
    ///
    /// Only top-level entries are inspected: a condition map holding any
    /// condition from [`OFFLINE_UNSUPPORTED`] makes the query unsupported.
    pub fn is_supported_offline(&self) -> bool {
        self.filter
            .borrow()
            .iter()
            .all(|(_, clause)| is_offline_safe(clause))
    }
}

fn is_offline_safe(clause: &Clause) -> bool {
    if let Clause::Value(value) = clause {
        if !is_truthy(value) {
            return true;
        }
    }

    match clause.as_conditions() {
        Some(conditions) => !conditions
            .keys()
            .any(|condition| OFFLINE_UNSUPPORTED.contains(&condition.as_str())),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use serde_json::json;

    #[test]
    fn test_empty_query_is_supported() {
        assert!(Query::new().is_supported_offline());
    }

    #[test]
    fn test_plain_conditions_are_supported() {
        let query = Query::new()
            .equal_to("name", "ALICE")
            .greater_than("age", 21)
            .unwrap()
            .within_box("loc", json!([0, 0]), json!([1, 1]))
            .unwrap();
        assert!(query.is_supported_offline());
    }

    #[test]
    fn test_near_sphere_is_unsupported() {
        let query = Query::new()
            .equal_to("name", "ALICE")
            .near("loc", json!([1, 2]))
            .unwrap();
        assert!(!query.is_supported_offline());
    }

    #[test]
    fn test_near_sphere_in_direct_object_is_unsupported() {
        let query = Query::new().equal_to("loc", json!({ "$nearSphere": [1, 2] }));
        assert!(!query.is_supported_offline());
    }

    #[test]
    fn test_only_top_level_is_inspected() {
        let filter = Filter::try_from(json!({ "loc": { "$nearSphere": [1, 2] } })).unwrap();
        let query = Query::new().equal_to("a", 1).or_with([filter]);
        assert!(query.is_supported_offline());
    }

    #[test]
    fn test_falsy_values_are_supported() {
        let query = Query::new().equal_to("deleted", false).equal_to("parent", json!(null));
        assert!(query.is_supported_offline());
    }
}
