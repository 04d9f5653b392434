//! Contract metadata as reported by a deployed chaincode.
//!
//! A metadata snapshot describes, for one contract group (chaincode), every
//! contract it exposes, the operations on each contract, and the shared
//! schema definitions those operations refer to.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::SchemaNode;

/// Tag that marks an operation as state-mutating.
pub const SUBMIT_TAG: &str = "submitTx";

/// Errors raised while accepting a metadata snapshot.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("malformed contract metadata: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("contract `{contract}` has an empty name")]
    EmptyContractName { contract: String },

    #[error("contract `{contract}` declares an operation with an empty name")]
    EmptyOperationName { contract: String },

    #[error("operation `{contract}.{operation}` declares a parameter with an empty name")]
    EmptyParameterName { contract: String, operation: String },
}

/// How an operation reaches the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Endorsed and committed; changes ledger state.
    Submit,
    /// Read-only query against a single peer.
    Evaluate,
}

impl std::fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationMode::Submit => write!(f, "submit"),
            InvocationMode::Evaluate => write!(f, "evaluate"),
        }
    }
}

/// One named input of an operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperationParameter {
    pub name: String,
    pub schema: SchemaNode,
}

impl OperationParameter {
    /// Whether the argument is forwarded verbatim instead of re-serialized.
    pub fn is_string(&self) -> bool {
        self.schema.schema_type() == Some("string")
    }
}

/// One callable operation on a contract.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawOperation")]
pub struct OperationDescriptor {
    pub name: String,
    pub parameters: Vec<OperationParameter>,
    pub tags: Vec<String>,
    pub returns: Option<SchemaNode>,
}

/// Wire form of an operation. Fabric spells the tag list `tag`; both
/// spellings are accepted and, when both appear, concatenated.
#[derive(Deserialize)]
struct RawOperation {
    name: String,
    #[serde(default)]
    parameters: Vec<OperationParameter>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    tag: Vec<String>,
    #[serde(default)]
    returns: Option<SchemaNode>,
}

impl From<RawOperation> for OperationDescriptor {
    fn from(raw: RawOperation) -> Self {
        let mut tags = raw.tags;
        for tag in raw.tag {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Self {
            name: raw.name,
            parameters: raw.parameters,
            tags,
            returns: raw.returns,
        }
    }
}

impl OperationDescriptor {
    pub fn mode(&self) -> InvocationMode {
        if self.tags.iter().any(|tag| tag == SUBMIT_TAG) {
            InvocationMode::Submit
        } else {
            InvocationMode::Evaluate
        }
    }
}

/// Shared schema definitions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComponentMetadata {
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaNode>,
}

/// A named group of operations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContractDescriptor {
    pub name: String,
    #[serde(default, alias = "transactions")]
    pub operations: Vec<OperationDescriptor>,
    /// Definitions scoped to this contract alone.
    #[serde(default)]
    pub components: Option<ComponentMetadata>,
}

/// Full metadata snapshot for one contract group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChaincodeMetadata {
    pub contracts: BTreeMap<String, ContractDescriptor>,
    #[serde(default)]
    pub components: ComponentMetadata,
}

impl ChaincodeMetadata {
    /// Parse the raw bytes returned by the metadata query.
    pub fn from_slice(raw: &[u8]) -> Result<Self, MetadataError> {
        let metadata: ChaincodeMetadata = serde_json::from_slice(raw)?;
        metadata.validate()?;
        Ok(metadata)
    }

    fn validate(&self) -> Result<(), MetadataError> {
        for (key, contract) in &self.contracts {
            if contract.name.is_empty() {
                return Err(MetadataError::EmptyContractName {
                    contract: key.clone(),
                });
            }
            for operation in &contract.operations {
                if operation.name.is_empty() {
                    return Err(MetadataError::EmptyOperationName {
                        contract: key.clone(),
                    });
                }
                if operation.parameters.iter().any(|p| p.name.is_empty()) {
                    return Err(MetadataError::EmptyParameterName {
                        contract: key.clone(),
                        operation: operation.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Total number of operations across all contracts.
    pub fn operation_count(&self) -> usize {
        self.contracts.values().map(|c| c.operations.len()).sum()
    }
}
