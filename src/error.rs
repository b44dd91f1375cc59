//! Error types for the pagesift host.

use pagesift_rank::{ConfigError, SearchError};

/// Top-level error type for the CLI and HTTP service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A search call failed.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// The ranking weights could not be loaded, validated or saved.
    #[error(transparent)]
    Weights(#[from] ConfigError),

    /// Application configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Corpus import error.
    #[error("corpus error: {0}")]
    Corpus(String),

    /// HTTP service error.
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_errors_pass_through_unchanged() {
        let err: AppError = SearchError::QueryParse("unterminated phrase".into()).into();
        assert_eq!(err.to_string(), "query parse error: unterminated phrase");
    }

    #[test]
    fn weight_errors_pass_through_unchanged() {
        let err: AppError = ConfigError::LockPoisoned.into();
        assert_eq!(err.to_string(), "weight store lock poisoned");
    }

    #[test]
    fn io_errors_are_wrapped() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "I/O error: gone");
    }
}
