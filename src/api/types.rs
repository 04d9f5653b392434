//! API request and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::TransactionOutput;

// ==================== Transactions ====================

impl IntoResponse for TransactionOutput {
    fn into_response(self) -> Response {
        match self {
            TransactionOutput::Json(value) => (StatusCode::OK, Json(value)).into_response(),
            TransactionOutput::Text(text) => (StatusCode::OK, text).into_response(),
            TransactionOutput::Empty => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Number of synthesized operation routes.
    pub paths: usize,
    /// Number of published schema definitions.
    pub schemas: usize,
    /// When the route tree was synthesized (RFC 3339).
    pub synthesized_at: String,
}
