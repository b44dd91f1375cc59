//! Error types for the pagesift-rank crate.
//!
//! Every failure path of a search or a weight update ends in one of these
//! values. Messages are stable lowercase strings suitable for display.

use std::path::PathBuf;

/// Errors that end a single search call.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The index store rejected the query text. Carries the store's message
    /// verbatim; never retried.
    #[error("query parse error: {0}")]
    QueryParse(String),

    /// The index store failed for a reason other than query syntax.
    #[error("index error: {0}")]
    Index(String),

    /// Invalid search configuration or request.
    #[error("config error: {0}")]
    Config(String),
}

/// Errors raised by the weight configuration store.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A weight was negative, infinite or NaN.
    #[error("invalid weight `{field}`: {value} (must be a finite, non-negative number)")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A weight supplied as text could not be parsed as a number.
    #[error("invalid weight `{field}`: {raw:?} is not a number")]
    NotANumber {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected input.
        raw: String,
    },

    /// The persisted weights file exists but could not be read.
    #[error("failed to read weights file '{}': {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The persisted weights file is not valid TOML or has the wrong shape.
    #[error("failed to parse weights file '{}': {message}", path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Writing, syncing or renaming the weights file failed.
    #[error("failed to write weights file '{}': {source}", path.display())]
    Write {
        /// Destination (or temporary) file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The weights could not be serialised.
    #[error("failed to serialize weights: {0}")]
    Serialize(String),

    /// The update lock was poisoned by a panicking writer.
    #[error("weight store lock poisoned")]
    LockPoisoned,
}

/// Errors an index store adaptor may report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Malformed query text.
    #[error("{0}")]
    Parse(String),

    /// The store could not serve the request.
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// A hit failed validation while being built.
    #[error("invalid hit: {0}")]
    InvalidHit(String),
}

impl From<IndexError> for SearchError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Parse(message) => Self::QueryParse(message),
            other => Self::Index(other.to_string()),
        }
    }
}

/// Convenience type alias for search results.
pub type Result<T> = std::result::Result<T, SearchError>;
