//! Metadata read from a local file instead of the deployed chaincode.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ChaincodeMetadata;
use crate::ledger::{BackendError, BackendResult, LedgerBackend, TransactionTarget};

/// Wraps a backend and answers metadata queries from a JSON file.
///
/// Every contract group resolves to the same file. Directory listing and
/// transactions go to the wrapped backend.
pub struct LocalMetadata {
    inner: Arc<dyn LedgerBackend>,
    path: PathBuf,
}

impl LocalMetadata {
    pub fn new(inner: Arc<dyn LedgerBackend>, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }
}

#[async_trait]
impl LedgerBackend for LocalMetadata {
    async fn list_networks(&self) -> BackendResult<Vec<String>> {
        self.inner.list_networks().await
    }

    async fn list_contract_groups(&self, network: &str) -> BackendResult<Vec<String>> {
        self.inner.list_contract_groups(network).await
    }

    async fn fetch_metadata(
        &self,
        network: &str,
        contract_group: &str,
    ) -> BackendResult<ChaincodeMetadata> {
        tracing::info!(
            path = %self.path.display(),
            network = %network,
            contract_group = %contract_group,
            "Reading metadata from local file"
        );
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| BackendError::MetadataFile {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(ChaincodeMetadata::from_slice(&raw)?)
    }

    async fn submit_transaction(
        &self,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>> {
        self.inner.submit_transaction(target, args).await
    }

    async fn evaluate_transaction(
        &self,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>> {
        self.inner.evaluate_transaction(target, args).await
    }
}
