//! Ledger backend boundary.
//!
//! The gateway never speaks to peers directly; everything it needs from the
//! network goes through [`LedgerBackend`].

mod gateway;
mod local;
#[cfg(test)]
pub mod mock;

pub use gateway::*;
pub use local::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ChaincodeMetadata, MetadataError};

/// Errors reported by a ledger backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The ledger accepted the call and reported a failure. The message is
    /// passed through untouched and may span several lines.
    #[error("{0}")]
    Rejected(String),

    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("failed to read metadata file {path}: {source}")]
    MetadataFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Fully qualified name of one contract operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionTarget {
    pub network: String,
    pub contract_group: String,
    pub contract: String,
    pub operation: String,
}

impl TransactionTarget {
    /// Function name as the chaincode dispatches it: `<contract>:<operation>`.
    pub fn function_name(&self) -> String {
        format!("{}:{}", self.contract, self.operation)
    }
}

impl std::fmt::Display for TransactionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.network, self.contract_group, self.contract, self.operation
        )
    }
}

/// Connection to the ledger, shared by every request.
///
/// Implementations must tolerate concurrent calls; the gateway takes no lock
/// around them.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Networks (channels) this gateway exposes.
    async fn list_networks(&self) -> BackendResult<Vec<String>>;

    /// Contract groups (chaincodes) deployed on a network.
    async fn list_contract_groups(&self, network: &str) -> BackendResult<Vec<String>>;

    /// Metadata snapshot for one contract group.
    async fn fetch_metadata(
        &self,
        network: &str,
        contract_group: &str,
    ) -> BackendResult<ChaincodeMetadata>;

    /// Submit a state-mutating transaction and wait for its result.
    async fn submit_transaction(
        &self,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>>;

    /// Evaluate a read-only transaction.
    async fn evaluate_transaction(
        &self,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>>;
}
