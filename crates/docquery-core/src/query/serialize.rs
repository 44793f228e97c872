//! Snapshots and transport encoding

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Query;
use crate::error::Result;
use crate::filter::Filter;
use crate::sort::Sort;

/// Plain-data snapshot of a query; also accepted as configuration by
/// [`Query::from_config`].
///
/// An unbounded `limit` encodes as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlainQuery {
    pub fields: Vec<String>,
    pub filter: Filter,
    pub sort: Sort,
    pub skip: u64,
    pub limit: Option<u64>,
}

/// The compiled form handed to a transport.
///
/// Every present value is a string: JSON for the filter, sort and numbers,
/// a comma-joined list for fields. Absent entries are omitted when encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl QueryObject {
    pub fn is_empty(&self) -> bool {
        self.to_pairs().is_empty()
    }

    /// Present entries as `(name, value)` pairs, in encoding order.
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("query", &self.query),
            ("fields", &self.fields),
            ("limit", &self.limit),
            ("skip", &self.skip),
            ("sort", &self.sort),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
        .collect()
    }
}

impl Query {
    /// Snapshot of the top-level query this handle belongs to.
    pub fn to_plain_object(&self) -> PlainQuery {
        let root = self.root();
        let settings = root.settings();
        let filter = root.filter.borrow().clone();
        PlainQuery {
            fields: root.fields(),
            filter,
            sort: settings.sort.clone(),
            skip: settings.skip,
            limit: settings.limit,
        }
    }

    /// Compile the top-level query this handle belongs to.
    ///
    /// `query` is present only for a non-empty filter, `fields` only for a
    /// non-empty projection, `limit` only when bounded, `skip` only when
    /// positive and `sort` only when non-empty.
    pub fn to_query_object(&self) -> Result<QueryObject> {
        let root = self.root();
        let settings = root.settings();
        let filter = root.filter.borrow();
        let fields = root.fields();

        let query = if filter.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&*filter)?)
        };
        let sort = if settings.sort.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&settings.sort)?)
        };
        let limit = match settings.limit {
            Some(limit) => Some(serde_json::to_string(&limit)?),
            None => None,
        };
        let skip = if settings.skip > 0 {
            Some(serde_json::to_string(&settings.skip)?)
        } else {
            None
        };

        Ok(QueryObject {
            query,
            fields: (!fields.is_empty()).then(|| fields.join(",")),
            limit,
            skip,
            sort,
        })
    }
}

impl fmt::Display for Query {
    /// The compiled query object as JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let object = self.to_query_object().map_err(|_| fmt::Error)?;
        let json = serde_json::to_string(&object).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
