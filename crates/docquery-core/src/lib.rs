//! docquery core
//!
//! A fluent builder for document-store filters. Queries collect comparison,
//! geospatial and pattern conditions, combine them with `$and` / `$nor` /
//! `$or` under a fixed precedence, and compile to a string-valued
//! [`QueryObject`] for a transport to send.
//!
//! # Example
//!
//! ```rust
//! use docquery_core::Query;
//!
//! let query = Query::new()
//!     .equal_to("status", "active")
//!     .greater_than("age", 21)
//!     .unwrap()
//!     .descending("age");
//!
//! let object = query.to_query_object().unwrap();
//! assert_eq!(object.query.as_deref(), Some(r#"{"status":"active","age":{"$gt":21}}"#));
//! assert_eq!(object.sort.as_deref(), Some(r#"{"age":-1}"#));
//! ```

pub mod error;
pub mod filter;
pub mod pattern;
pub mod query;
pub mod sort;
pub mod transport;

// Re-export main types at crate root
pub use error::{QueryError, Result};
pub use filter::{Clause, Filter, LogicalOperator, SharedFilter};
pub use pattern::{MatchOptions, Pattern};
pub use query::{Operand, PlainQuery, Query, QueryObject, RESERVED_FIELDS};
pub use sort::{Sort, SortDirection};
pub use transport::QueryTransport;
