//! Contract REST - HTTP gateway for smart contracts
//!
//! Discovers the contracts deployed on a ledger at boot, synthesizes one
//! POST route per contract operation, and publishes a merged OpenAPI
//! document describing them.

use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;

mod api;
mod config;
mod domain;
mod engine;
mod error;
mod ledger;
mod logging;

use crate::api::{build_router, synthesize};
use crate::config::Config;
use crate::domain::{ApiDocument, Info};
use crate::ledger::{GatewayClient, LedgerBackend, LocalMetadata};

/// Application state shared across service handlers.
#[derive(Clone)]
pub struct AppState {
    /// The merged interface document.
    pub document: Arc<ApiDocument>,
    /// `document` rendered once as JSON.
    pub document_json: Bytes,
    /// When the route tree was built.
    pub synthesized_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(document: ApiDocument, synthesized_at: DateTime<Utc>) -> serde_json::Result<Self> {
        let document_json = Bytes::from(serde_json::to_vec(&document)?);
        Ok(Self {
            document: Arc::new(document),
            document_json,
            synthesized_at,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting Contract REST v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        gateway = %config.fabric.gateway_url,
        channel = %config.fabric.channel,
        chaincode = %config.fabric.chaincode,
        local_metadata = ?config.metadata.local_file,
        "Configuration loaded"
    );

    let backend = build_backend(&config)?;

    // Synthesis must finish before the listener binds
    let tree = synthesize(backend).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to synthesize routes");
        anyhow::anyhow!("Route synthesis error: {}", e)
    })?;

    let document = ApiDocument::new(
        Info {
            title: config.document.title.clone(),
            version: config.document.version.clone(),
        },
        tree.fragment,
    );

    if let Some(output_file) = &config.metadata.output_file {
        document
            .write_json(Path::new(output_file))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path = %output_file, "Failed to write document");
                anyhow::anyhow!("Document export error: {}", e)
            })?;
        tracing::info!(path = %output_file, "Interface document written");
    }

    let state = AppState::new(document, Utc::now())?;

    let app = build_router(state, tree.router);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Gateway client, optionally with metadata served from a local file.
fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn LedgerBackend>> {
    let gateway: Arc<dyn LedgerBackend> = Arc::new(GatewayClient::new(&config.fabric)?);

    let backend: Arc<dyn LedgerBackend> = match &config.metadata.local_file {
        Some(path) => Arc::new(LocalMetadata::new(gateway, path)),
        None => gateway,
    };
    Ok(backend)
}
