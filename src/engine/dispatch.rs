//! Operation dispatcher.
//!
//! Turns a JSON request body into positional string arguments, calls the
//! ledger in the operation's invocation mode, and classifies the returned
//! buffer.

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{InvocationMode, OperationDescriptor, OperationParameter};
use crate::error::{GatewayError, GatewayResult};
use crate::ledger::{LedgerBackend, TransactionTarget};

/// Successful outcome of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutput {
    /// The ledger returned JSON text.
    Json(Value),
    /// The ledger returned bytes that are not JSON; passed through as text.
    Text(String),
    /// The ledger returned nothing.
    Empty,
}

impl TransactionOutput {
    /// Classify a raw result buffer.
    ///
    /// Only a syntax-class decode failure falls back to text; any other
    /// failure is an error. serde_json reports out-of-range numbers and
    /// nesting beyond 128 levels as syntax errors, so those buffers are
    /// passed through as text too.
    pub fn from_buffer(raw: &[u8]) -> GatewayResult<Self> {
        if raw.is_empty() {
            return Ok(TransactionOutput::Empty);
        }

        match serde_json::from_slice::<Value>(raw) {
            Ok(value) => Ok(TransactionOutput::Json(value)),
            Err(e) if e.is_syntax() || e.is_eof() => Ok(TransactionOutput::Text(
                String::from_utf8_lossy(raw).into_owned(),
            )),
            Err(e) => Err(GatewayError::Serialization(e)),
        }
    }
}

/// Handler state for one synthesized operation route.
///
/// Built once at boot; the invocation mode is resolved from the descriptor's
/// tags here rather than per request.
pub struct OperationDispatcher {
    backend: Arc<dyn LedgerBackend>,
    target: TransactionTarget,
    parameters: Vec<OperationParameter>,
    mode: InvocationMode,
}

impl OperationDispatcher {
    pub fn new(
        backend: Arc<dyn LedgerBackend>,
        target: TransactionTarget,
        operation: &OperationDescriptor,
    ) -> Self {
        Self {
            backend,
            target,
            parameters: operation.parameters.clone(),
            mode: operation.mode(),
        }
    }

    pub fn mode(&self) -> InvocationMode {
        self.mode
    }

    /// Positional arguments in declaration order.
    ///
    /// String-typed parameters whose value is a JSON string are passed
    /// verbatim; every other value is passed as compact JSON text.
    pub fn collect_arguments(&self, body: &Map<String, Value>) -> GatewayResult<Vec<String>> {
        let mut args = Vec::with_capacity(self.parameters.len());
        let mut missing = Vec::new();

        for parameter in &self.parameters {
            match body.get(&parameter.name) {
                Some(Value::String(raw)) if parameter.is_string() => args.push(raw.clone()),
                Some(value) => args.push(value.to_string()),
                None => missing.push(parameter.name.clone()),
            }
        }

        if missing.is_empty() {
            Ok(args)
        } else {
            Err(GatewayError::MissingParameters(missing))
        }
    }

    /// Run the operation for one request body.
    pub async fn dispatch(&self, body: &Map<String, Value>) -> GatewayResult<TransactionOutput> {
        let request_id = Uuid::new_v4();
        let args = self.collect_arguments(body).inspect_err(|e| {
            tracing::info!(
                request_id = %request_id,
                target = %self.target,
                error = %e,
                "Rejected transaction request"
            );
        })?;

        tracing::info!(
            request_id = %request_id,
            target = %self.target,
            mode = %self.mode,
            args = args.len(),
            "Dispatching transaction"
        );

        let result = match self.mode {
            InvocationMode::Submit => self.backend.submit_transaction(&self.target, &args).await,
            InvocationMode::Evaluate => self.backend.evaluate_transaction(&self.target, &args).await,
        };

        let raw = result.map_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                target = %self.target,
                error = %e,
                "Transaction failed"
            );
            GatewayError::Invocation(e)
        })?;

        tracing::info!(
            request_id = %request_id,
            target = %self.target,
            bytes = raw.len(),
            "Transaction complete"
        );

        TransactionOutput::from_buffer(&raw)
    }
}
