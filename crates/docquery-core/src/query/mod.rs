//! Fluent query builder
//!
//! A [`Query`] accumulates filter conditions, a field projection, a sort
//! specification and paging, and compiles them into a [`QueryObject`] for a
//! transport to send.
//!
//! Logical combinators follow a fixed precedence, AND binding tighter than
//! NOR, which binds tighter than OR. Calling a combinator with no operands
//! returns a *branch*: a handle whose filter edits land inside the
//! combination, while `fields`, `sort`, `limit` and `skip` keep resolving to
//! the query the branch came from.
//!
//! # Example
//!
//! ```rust
//! use docquery_core::Query;
//! use serde_json::json;
//!
//! let query = Query::new()
//!     .greater_than("age", 21)
//!     .unwrap()
//!     .and_with([Query::new().equal_to("active", true)]);
//!
//! assert_eq!(
//!     query.filter().to_value(),
//!     json!({ "$and": [{ "age": { "$gt": 21 } }, { "active": true }] })
//! );
//! ```

mod builders;
mod offline;
mod precedence;
mod serialize;

pub use precedence::Operand;
pub use serialize::{PlainQuery, QueryObject};

use serde_json::Value;
use tracing::debug;

use crate::error::{QueryError, Result};
use crate::filter::{shared, Filter, SharedFilter};
use crate::sort::Sort;

/// Fields appended to every non-empty projection.
pub const RESERVED_FIELDS: [&str; 2] = ["_id", "_acl"];

/// Projection, ordering and paging. Only a root query owns these.
#[derive(Debug, Clone, Default, PartialEq)]
struct Settings {
    fields: Vec<String>,
    sort: Sort,
    limit: Option<u64>,
    skip: u64,
}

#[derive(Debug)]
enum Scope {
    Root(Settings),
    /// Created by a combinator called without operands; owns the query it
    /// was opened from.
    Branch(Box<Query>),
}

/// A document query under construction.
///
/// `Query` is deliberately not `Clone`: a branch shares its filter with the
/// combination it belongs to. Use [`Query::filter`] or
/// [`Query::to_plain_object`] for detached copies.
#[derive(Debug)]
pub struct Query {
    filter: SharedFilter,
    scope: Scope,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    /// An empty root query: no filter, no projection, unbounded, unsorted.
    pub fn new() -> Self {
        Self {
            filter: shared(Filter::new()),
            scope: Scope::Root(Settings::default()),
        }
    }

    /// Seed a root query from a plain snapshot.
    pub fn from_config(config: PlainQuery) -> Result<Self> {
        let PlainQuery {
            fields,
            filter,
            sort,
            skip,
            limit,
        } = config;

        if limit == Some(0) {
            return Err(QueryError::InvalidLimit("0".to_string()));
        }

        Ok(Self {
            filter: shared(filter),
            scope: Scope::Root(Settings {
                fields,
                sort,
                limit,
                skip,
            }),
        })
    }

    /// Whether this handle is a branch of another query.
    pub fn is_branch(&self) -> bool {
        matches!(self.scope, Scope::Branch(_))
    }

    /// The top-level query this handle belongs to (itself for a root).
    pub fn root(&self) -> &Query {
        match &self.scope {
            Scope::Root(_) => self,
            Scope::Branch(parent) => parent.root(),
        }
    }

    /// Drop any branch handles and return the top-level query.
    pub fn into_root(self) -> Query {
        match self.scope {
            Scope::Branch(parent) => parent.into_root(),
            scope => Query {
                filter: self.filter,
                scope,
            },
        }
    }

    fn settings(&self) -> &Settings {
        match &self.scope {
            Scope::Root(settings) => settings,
            Scope::Branch(parent) => parent.settings(),
        }
    }

    fn settings_mut(&mut self) -> &mut Settings {
        match &mut self.scope {
            Scope::Root(settings) => settings,
            Scope::Branch(parent) => parent.settings_mut(),
        }
    }

    /// A detached copy of this handle's own filter.
    ///
    /// For a branch this is the branch's side of the combination, not the
    /// whole tree; use [`Query::root`] for the latter.
    pub fn filter(&self) -> Filter {
        self.filter.borrow().clone()
    }

    /// Requested fields, with [`RESERVED_FIELDS`] appended when any field
    /// was requested.
    pub fn fields(&self) -> Vec<String> {
        let explicit = &self.settings().fields;
        if explicit.is_empty() {
            return Vec::new();
        }

        let mut fields = explicit.clone();
        for reserved in RESERVED_FIELDS {
            if !fields.iter().any(|f| f == reserved) {
                fields.push(reserved.to_string());
            }
        }
        fields
    }

    pub fn sort(&self) -> &Sort {
        &self.settings().sort
    }

    /// `None` means unbounded.
    pub fn limit(&self) -> Option<u64> {
        self.settings().limit
    }

    pub fn skip(&self) -> u64 {
        self.settings().skip
    }

    /// Replace the projection. Expects an array of strings.
    pub fn set_fields(&mut self, fields: impl Into<Value>) -> Result<()> {
        let fields = parse_fields(fields.into())
            .inspect_err(|err| debug!(%err, "rejected fields"))?;
        self.settings_mut().fields = fields;
        Ok(())
    }

    /// Replace the sort specification. Expects an object of `1` / `-1`
    /// directions; `null` clears it.
    pub fn set_sort(&mut self, sort: impl Into<Value>) -> Result<()> {
        let sort = Sort::try_from(sort.into()).inspect_err(|err| debug!(%err, "rejected sort"))?;
        self.settings_mut().sort = sort;
        Ok(())
    }

    /// Set the page size. Accepts a number or numeric string; `null` or an
    /// infinite value removes the bound.
    pub fn set_limit(&mut self, limit: impl Into<Value>) -> Result<()> {
        let limit = parse_limit(&limit.into()).inspect_err(|err| debug!(%err, "rejected limit"))?;
        self.settings_mut().limit = limit;
        Ok(())
    }

    /// Set the number of documents to skip. Accepts a number or numeric string.
    pub fn set_skip(&mut self, skip: impl Into<Value>) -> Result<()> {
        let skip = parse_skip(&skip.into()).inspect_err(|err| debug!(%err, "rejected skip"))?;
        self.settings_mut().skip = skip;
        Ok(())
    }
}

impl TryFrom<Value> for Query {
    type Error = QueryError;

    /// Seed a root query from a plain JSON object. Missing keys keep their
    /// defaults; present keys go through the validated setters.
    fn try_from(config: Value) -> Result<Self> {
        let Value::Object(mut config) = config else {
            return Err(QueryError::InvalidFilter(
                "query configuration must be an object".to_string(),
            ));
        };

        let mut query = Query::new();
        if let Some(fields) = config.remove("fields") {
            query.set_fields(fields)?;
        }
        if let Some(filter) = config.remove("filter") {
            query.filter = shared(Filter::try_from(filter)?);
        }
        if let Some(sort) = config.remove("sort") {
            query.set_sort(sort)?;
        }
        if let Some(limit) = config.remove("limit") {
            query.set_limit(limit)?;
        }
        if let Some(skip) = config.remove("skip") {
            query.set_skip(skip)?;
        }
        Ok(query)
    }
}

fn parse_fields(value: Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(QueryError::InvalidFields);
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(field) => Ok(field),
            _ => Err(QueryError::InvalidFields),
        })
        .collect()
}

/// A number, or a string holding one.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_limit(value: &Value) -> Result<Option<u64>> {
    if value.is_null() {
        return Ok(None);
    }
    match numeric(value) {
        Some(n) if n == f64::INFINITY => Ok(None),
        Some(n) if n >= 1.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => Ok(Some(n as u64)),
        _ => Err(QueryError::InvalidLimit(value.to_string())),
    }
}

fn parse_skip(value: &Value) -> Result<u64> {
    match numeric(value) {
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => Ok(n as u64),
        _ => Err(QueryError::InvalidSkip(value.to_string())),
    }
}
