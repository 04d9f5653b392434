//! Route definitions for the API.

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::AppState;

/// First path segments owned by service endpoints. Networks may not use them.
pub const RESERVED_SEGMENTS: &[&str] = &["swagger.json", "health", "swagger-ui", "api-docs"];

/// OpenAPI documentation for the service's own endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::interface_document, handlers::health_check),
    components(schemas(crate::api::types::HealthResponse)),
    tags(
        (name = "documentation", description = "Synthesized contract API document"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Contract REST Service",
        version = "0.1.0",
        description = "Service endpoints of the smart contract REST gateway",
        license(name = "Apache-2.0")
    )
)]
pub struct ApiDoc;

/// Assemble the application router around the synthesized contract routes.
pub fn build_router(state: AppState, contracts: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_ui = match serde_json::to_value(state.document.as_ref()) {
        Ok(document) => SwaggerUi::new("/swagger-ui")
            .external_url_unchecked("/api-docs/openapi.json", document)
            .url("/api-docs/service.json", ApiDoc::openapi()),
        Err(e) => {
            tracing::warn!(error = %e, "Contract document unavailable to Swagger UI");
            SwaggerUi::new("/swagger-ui").url("/api-docs/service.json", ApiDoc::openapi())
        }
    };

    Router::new()
        // Service endpoints
        .route("/swagger.json", get(handlers::interface_document))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        // Synthesized contract routes
        .merge(contracts)
        // OpenAPI docs
        .merge(swagger_ui)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
