//! In-memory ledger for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{ChaincodeMetadata, InvocationMode};
use crate::ledger::{BackendError, BackendResult, LedgerBackend, TransactionTarget};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub mode: InvocationMode,
    pub target: TransactionTarget,
    pub args: Vec<String>,
}

/// Scripted ledger: fixed directory, fixed metadata, one canned reply.
#[derive(Default)]
pub struct MockLedger {
    directory: BTreeMap<String, Vec<String>>,
    metadata: BTreeMap<(String, String), serde_json::Value>,
    reply: Option<Result<Vec<u8>, String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract group and its raw metadata under a network.
    pub fn with_contract_group(
        mut self,
        network: &str,
        contract_group: &str,
        metadata: serde_json::Value,
    ) -> Self {
        self.directory
            .entry(network.to_string())
            .or_default()
            .push(contract_group.to_string());
        self.metadata
            .insert((network.to_string(), contract_group.to_string()), metadata);
        self
    }

    pub fn respond_with(mut self, payload: Vec<u8>) -> Self {
        self.reply = Some(Ok(payload));
        self
    }

    pub fn fail_with(mut self, message: &str) -> Self {
        self.reply = Some(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        mode: InvocationMode,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>> {
        self.calls.lock().unwrap().push(RecordedCall {
            mode,
            target: target.clone(),
            args: args.to_vec(),
        });
        match &self.reply {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(message)) => Err(BackendError::Rejected(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl LedgerBackend for MockLedger {
    async fn list_networks(&self) -> BackendResult<Vec<String>> {
        Ok(self.directory.keys().cloned().collect())
    }

    async fn list_contract_groups(&self, network: &str) -> BackendResult<Vec<String>> {
        Ok(self.directory.get(network).cloned().unwrap_or_default())
    }

    async fn fetch_metadata(
        &self,
        network: &str,
        contract_group: &str,
    ) -> BackendResult<ChaincodeMetadata> {
        let raw = self
            .metadata
            .get(&(network.to_string(), contract_group.to_string()))
            .cloned()
            .ok_or_else(|| {
                BackendError::Rejected(format!("chaincode {contract_group} not found on {network}"))
            })?;
        Ok(ChaincodeMetadata::from_slice(raw.to_string().as_bytes())?)
    }

    async fn submit_transaction(
        &self,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>> {
        self.record(InvocationMode::Submit, target, args)
    }

    async fn evaluate_transaction(
        &self,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>> {
        self.record(InvocationMode::Evaluate, target, args)
    }
}
