//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};

use crate::api::types::*;
use crate::engine::{OperationDispatcher, TransactionOutput};
use crate::error::{GatewayError, GatewayResult};
use crate::AppState;

/// Invoke one synthesized contract operation.
///
/// POST /{network}/{contract_group}/{contract}/{operation}
///
/// The body is a JSON object keyed by parameter name. An empty body is
/// treated as an object with no keys.
pub async fn invoke_operation(
    State(dispatcher): State<Arc<OperationDispatcher>>,
    body: Bytes,
) -> GatewayResult<TransactionOutput> {
    let arguments = parse_arguments(&body)?;
    dispatcher.dispatch(&arguments).await
}

fn parse_arguments(body: &[u8]) -> GatewayResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice(body) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(_) => Err(GatewayError::MalformedBody(
            "Body must be a JSON object".to_string(),
        )),
        Err(e) => Err(GatewayError::MalformedBody(format!(
            "Body is not valid JSON: {e}"
        ))),
    }
}

/// Serve the merged interface document.
///
/// GET /swagger.json
#[utoipa::path(
    get,
    path = "/swagger.json",
    responses(
        (status = 200, description = "OpenAPI document for every synthesized contract route")
    ),
    tag = "documentation"
)]
pub async fn interface_document(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.document_json,
    )
}

/// Health check endpoint.
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        paths: state.document.fragment.path_count(),
        schemas: state.document.fragment.schema_count(),
        synthesized_at: state.synthesized_at.to_rfc3339(),
    })
}
