//! Configuration module for the contract REST gateway.
//!
//! Loads configuration from YAML files and environment variables.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub fabric: FabricConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub document: DocumentConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection to the Fabric gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct FabricConfig {
    /// Base URL of the gateway service.
    pub gateway_url: String,
    /// Wallet identity label to transact as.
    pub identity: String,
    /// Channel to expose.
    pub channel: String,
    /// Chaincode to expose on that channel.
    pub chaincode: String,
    /// Per-request timeout towards the gateway service.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where contract metadata comes from and where the document goes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataConfig {
    /// Read metadata from this JSON file rather than from the chaincode.
    #[serde(default)]
    pub local_file: Option<String>,
    /// Write the synthesized document here at boot, overwriting any existing file.
    #[serde(default)]
    pub output_file: Option<String>,
}

/// `info` block of the served document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    pub title: String,
    pub version: String,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (FRS__*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("FRS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: "Smart Contract REST API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
