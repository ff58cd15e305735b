//! Error kinds for a single search submission.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Blank input; rejected before any state change or network call.
    #[error("query must not be empty")]
    EmptyQuery,

    /// Transport failure, timeout, or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Response body present but not in the expected shape.
    #[error("invalid search response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
