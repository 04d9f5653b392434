//! HTTP client for a remote Fabric gateway service.
//!
//! The gateway service holds the peer connection and the signing identity;
//! this client fronts a single channel and chaincode.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::FabricConfig;
use crate::domain::ChaincodeMetadata;
use crate::ledger::{BackendError, BackendResult, LedgerBackend, TransactionTarget};

/// Header carrying the wallet identity label to transact as.
pub const IDENTITY_HEADER: &str = "X-Fabric-Identity";

/// System contract every chaincode exposes for self-description.
const METADATA_CONTRACT: &str = "org.hyperledger.fabric";
const METADATA_FUNCTION: &str = "GetMetadata";

#[derive(Debug, Serialize)]
struct TransactionRequest<'a> {
    function: String,
    args: &'a [String],
}

/// Which gateway endpoint a call goes to.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Submit,
    Evaluate,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Submit => "submit",
            Endpoint::Evaluate => "evaluate",
        }
    }
}

/// [`LedgerBackend`] backed by a Fabric gateway REST service.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    identity: String,
    channel: String,
    chaincode: String,
}

impl GatewayClient {
    pub fn new(config: &FabricConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            identity: config.identity.clone(),
            channel: config.channel.clone(),
            chaincode: config.chaincode.clone(),
        })
    }

    fn endpoint_url(&self, network: &str, contract_group: &str, endpoint: Endpoint) -> String {
        format!(
            "{}/channels/{}/chaincodes/{}/{}",
            self.base_url,
            network,
            contract_group,
            endpoint.path()
        )
    }

    async fn call(
        &self,
        network: &str,
        contract_group: &str,
        endpoint: Endpoint,
        function: String,
        args: &[String],
    ) -> BackendResult<Vec<u8>> {
        let url = self.endpoint_url(network, contract_group, endpoint);
        tracing::debug!(url = %url, function = %function, args = args.len(), "Calling gateway");

        let response = self
            .client
            .post(&url)
            .header(IDENTITY_HEADER, &self.identity)
            .json(&TransactionRequest { function, args })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).into_owned();
            tracing::warn!(url = %url, status = %status, "Gateway rejected transaction");
            return Err(BackendError::Rejected(if message.is_empty() {
                format!("gateway returned {status}")
            } else {
                message
            }));
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl LedgerBackend for GatewayClient {
    async fn list_networks(&self) -> BackendResult<Vec<String>> {
        Ok(vec![self.channel.clone()])
    }

    async fn list_contract_groups(&self, _network: &str) -> BackendResult<Vec<String>> {
        Ok(vec![self.chaincode.clone()])
    }

    async fn fetch_metadata(
        &self,
        network: &str,
        contract_group: &str,
    ) -> BackendResult<ChaincodeMetadata> {
        let function = format!("{METADATA_CONTRACT}:{METADATA_FUNCTION}");
        let raw = self
            .call(network, contract_group, Endpoint::Evaluate, function, &[])
            .await?;
        Ok(ChaincodeMetadata::from_slice(&raw)?)
    }

    async fn submit_transaction(
        &self,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>> {
        self.call(
            &target.network,
            &target.contract_group,
            Endpoint::Submit,
            target.function_name(),
            args,
        )
        .await
    }

    async fn evaluate_transaction(
        &self,
        target: &TransactionTarget,
        args: &[String],
    ) -> BackendResult<Vec<u8>> {
        self.call(
            &target.network,
            &target.contract_group,
            Endpoint::Evaluate,
            target.function_name(),
            args,
        )
        .await
    }
}
