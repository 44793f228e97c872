//! Transport boundary
//!
//! This crate only builds queries. Whatever sends them (HTTP client, local
//! cache adapter, test double) implements [`QueryTransport`]: it accepts a
//! compiled [`QueryObject`] and returns the raw response.

use serde_json::Value;
use tracing::debug;

use crate::error::QueryError;
use crate::query::{Query, QueryObject};

/// Sends compiled queries somewhere and returns raw results.
pub trait QueryTransport {
    /// Transport failure. Must absorb query compilation errors.
    type Error: From<QueryError>;

    fn send(&mut self, query: &QueryObject) -> Result<Value, Self::Error>;
}

impl Query {
    /// Compile the top-level query and hand it to `transport`.
    pub fn send_via<T: QueryTransport>(&self, transport: &mut T) -> Result<Value, T::Error> {
        let object = self.to_query_object()?;
        debug!(
            has_filter = object.query.is_some(),
            has_fields = object.fields.is_some(),
            "sending query"
        );
        transport.send(&object)
    }
}
