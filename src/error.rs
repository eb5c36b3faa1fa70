//! Error types
//!
//! Routing failures and file-serving outcomes as typed errors.

use hyper::StatusCode;
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error returned by application handlers
pub type HandlerError = Box<dyn StdError + Send + Sync>;

/// Result type returned by application handlers
pub type HandlerResult = Result<(), HandlerError>;

/// Errors raised by route registration and dispatch
#[derive(Debug, Error)]
pub enum RouterError {
    /// No registered route accepted the request
    #[error("route not found")]
    NoRoute,

    /// A route pattern failed to compile
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A route method is neither `*` nor a valid method token
    #[error("invalid route method `{0}`")]
    InvalidMethod(String),

    /// A matched handler returned an error
    #[error("handler failed: {0}")]
    Handler(#[source] HandlerError),
}

/// Outcomes of a static file request that did not produce content
#[derive(Debug, Error)]
pub enum FileError {
    /// Missing file, missing directory index, or denied extension
    #[error("file not found")]
    NotFound,

    /// Malformed or out-of-bounds byte range
    #[error("range not satisfiable")]
    RangeNotSatisfiable,

    /// Open/read/write failure while producing the response
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl FileError {
    /// HTTP status the failure is surfaced as
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_error_status() {
        assert_eq!(FileError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            FileError::RangeNotSatisfiable.status(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert_eq!(
            FileError::from(io).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_pattern_message() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = RouterError::InvalidPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid route pattern `(`"));
    }
}
