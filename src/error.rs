//! Error types for the contract REST gateway.
//!
//! Defines a unified error type that maps cleanly to HTTP responses. Every
//! error body has the shape `{ "msg": [line, ...] }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ledger::BackendError;

/// Unified error type for gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bad request. Missing parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Bad request. {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Invocation(BackendError),

    #[error("Failed to decode transaction result: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to load metadata for {network}/{contract_group}: {source}")]
    MetadataFetch {
        network: String,
        contract_group: String,
        #[source]
        source: BackendError,
    },

    #[error("Failed to list {level} entries: {source}")]
    Directory {
        level: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("Invalid {kind} identifier `{name}`: {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    #[error("Duplicate {kind} `{name}`")]
    DuplicateRoute { kind: &'static str, name: String },
}

/// Error response body for API clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub msg: Vec<String>,
}

impl ErrorResponse {
    /// One entry per line of `message`.
    pub fn from_message(message: &str) -> Self {
        Self {
            msg: message.split('\n').map(String::from).collect(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::MissingParameters(_) | GatewayError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Invocation(e) => {
                tracing::error!(error = %e, "Transaction failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            other => {
                tracing::error!(error = %other, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::from_message(&self.to_string()))).into_response()
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
