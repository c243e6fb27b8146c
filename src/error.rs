//! Error types for ShowGraph
//!
//! This module provides the crate-wide error hierarchy:
//! - `thiserror` for ergonomic error definitions
//! - Domain-specific variants for the graph client, query files and the HTTP layer
//! - Classification helpers used by the retry and fallback paths
//! - HTTP status code mapping for API responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ShowGraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ShowGraph
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration error: {message}")]
    Config { message: Cow<'static, str> },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        message: Cow<'static, str>,
    },

    // ========================================================================
    // Graph Database Errors
    // ========================================================================
    #[error("Graph database error: {message}")]
    Graph {
        message: Cow<'static, str>,
        #[source]
        source: Option<neo4rs::Error>,
    },

    #[error("Unexpected value in column '{column}': {message}")]
    RowDecode {
        column: &'static str,
        message: String,
    },

    #[error("Failed to read query file {}", path.display())]
    QueryFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    #[error("User {user_id} not found. Please create a new user.")]
    UserNotFound { user_id: i64 },

    // ========================================================================
    // API Errors
    // ========================================================================
    #[error("{message}")]
    BadRequest { message: Cow<'static, str> },

    #[error("Unknown recommendation strategy: {name}")]
    UnknownStrategy { name: String },
}

impl Error {
    // ========================================================================
    // Constructors for common error patterns
    // ========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a graph error without a driver source
    pub fn graph(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Graph {
            message: message.into(),
            source: None,
        }
    }

    /// Create a graph error wrapping the driver error
    pub fn graph_with_source(message: impl Into<Cow<'static, str>>, source: neo4rs::Error) -> Self {
        Self::Graph {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    // ========================================================================
    // Error Classification
    // ========================================================================

    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Graph { .. })
    }

    /// Returns true when the graph database could not serve the request.
    ///
    /// These are the errors the recommendation dispatcher answers with the
    /// fallback list instead of failing the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Graph { .. })
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } | Error::UnknownStrategy { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } | Error::UserNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Graph { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::InvalidConfig { .. } => "CONFIG_ERROR",
            Error::Graph { .. } => "GRAPH_ERROR",
            Error::RowDecode { .. } => "ROW_DECODE_ERROR",
            Error::QueryFile { .. } => "QUERY_FILE_ERROR",
            Error::NotFound { .. } | Error::UserNotFound { .. } => "NOT_FOUND",
            Error::BadRequest { .. } => "BAD_REQUEST",
            Error::UnknownStrategy { .. } => "UNKNOWN_STRATEGY",
        }
    }
}

// ============================================================================
// Error Response for API
// ============================================================================

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Don't expose internal error details
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// From implementations for external error types
// ============================================================================

impl From<neo4rs::Error> for Error {
    fn from(err: neo4rs::Error) -> Self {
        Error::Graph {
            message: err.to_string().into(),
            source: Some(err),
        }
    }
}

impl From<neo4rs::DeError> for Error {
    fn from(err: neo4rs::DeError) -> Self {
        Error::RowDecode {
            column: "row",
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(Error::graph("connection refused").is_retryable());
        assert!(!Error::not_found("user", "42").is_retryable());
        assert!(!Error::bad_request("User ID is required").is_retryable());
    }

    #[test]
    fn test_error_unavailable() {
        assert!(Error::graph("broken pipe").is_unavailable());
        // a schema mismatch is a query bug, not an outage
        let decode = Error::RowDecode {
            column: "exists",
            message: "expected bool".to_string(),
        };
        assert!(!decode.is_unavailable());
        assert_eq!(decode.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(decode.error_code(), "ROW_DECODE_ERROR");
        assert!(!Error::QueryFile {
            path: PathBuf::from("cypher/missing.cypher"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .is_unavailable());
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::not_found("user", "7").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::UnknownStrategy {
                name: "magic".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::graph("down").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::QueryFile {
                path: PathBuf::from("cypher/content_based.cypher"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_not_found_message() {
        let err = Error::UserNotFound { user_id: 12 };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "User 12 not found. Please create a new user."
        );
    }

    #[test]
    fn test_bad_request_message_is_verbatim() {
        assert_eq!(
            Error::bad_request("User ID is required").to_string(),
            "User ID is required"
        );
    }
}
