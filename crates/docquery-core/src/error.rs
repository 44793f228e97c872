//! Query error types

use thiserror::Error;

/// Errors raised while building or compiling a query.
///
/// Every builder validates its input before touching the query, so an error
/// never leaves a query partially updated.
#[derive(Debug, Error)]
pub enum QueryError {
    /// `fields` was not an array of strings
    #[error("fields must be an array of strings")]
    InvalidFields,

    /// `sort` was not an object of `1` / `-1` directions
    #[error("sort must be an object mapping fields to 1 or -1")]
    InvalidSort,

    /// `limit` was not a positive number
    #[error("limit must be a positive number, got {0}")]
    InvalidLimit(String),

    /// `skip` was not a non-negative number
    #[error("skip must be a non-negative number, got {0}")]
    InvalidSkip(String),

    /// A membership operator was given no value
    #[error("you must supply a value")]
    MissingValue,

    /// An ordering comparison was given something other than a number or string
    #[error("you must supply a number or string")]
    InvalidComparison,

    /// `$mod` divisor or remainder was not a number
    #[error("{argument} must be a number")]
    InvalidModulo { argument: &'static str },

    /// Regular expression without a leading `^`
    #[error("pattern must have '^' at the beginning of the expression to make it an anchored expression")]
    UnanchoredPattern,

    /// Case-insensitive matching was requested
    #[error("ignore case flag is not supported")]
    CaseInsensitivePattern,

    /// Regular expression literal could not be read
    #[error("invalid pattern literal: {0}")]
    InvalidPattern(String),

    /// Malformed coordinate or coordinate list
    #[error("{argument} must be a [number, number]")]
    InvalidCoordinate { argument: &'static str },

    /// `$size` operand was not a number
    #[error("size must be a number")]
    InvalidSize,

    /// A raw filter or configuration was not a JSON object
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// JSON encoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
