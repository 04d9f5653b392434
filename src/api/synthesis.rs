//! Route-tree synthesis.
//!
//! Walks network → contract group → contract → operation once at boot. Each
//! level produces a router and a document fragment; the parent namespaces
//! each child's fragment under the child's identifier, merges it, and nests
//! the child's router at `/<identifier>`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::{routing::post, Router};

use crate::api::handlers;
use crate::api::RESERVED_SEGMENTS;
use crate::domain::{Components, ContractDescriptor, Fragment, OperationEntry, PathItem};
use crate::engine::{namespace, OperationDispatcher};
use crate::error::{GatewayError, GatewayResult};
use crate::ledger::{LedgerBackend, TransactionTarget};

/// A synthesized subtree: its routes and the document fragment describing them.
pub struct RouteNode {
    pub router: Router,
    pub fragment: Fragment,
}

/// Reject identifiers that cannot be used as a single literal path segment.
fn validate_identifier(kind: &'static str, name: &str) -> GatewayResult<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.contains('/') {
        "must not contain `/`"
    } else if name.contains(':') || name.contains('*') {
        "must not contain `:` or `*`"
    } else {
        return Ok(());
    };

    Err(GatewayError::InvalidIdentifier {
        kind,
        name: name.to_string(),
        reason,
    })
}

/// One level of the tree while its children are being mounted.
struct Level {
    child_kind: &'static str,
    router: Router,
    fragment: Fragment,
    mounted: HashSet<String>,
}

impl Level {
    fn new(child_kind: &'static str, fragment: Fragment) -> Self {
        Self {
            child_kind,
            router: Router::new(),
            fragment,
            mounted: HashSet::new(),
        }
    }

    fn mount(mut self, identifier: &str, child: RouteNode) -> GatewayResult<Self> {
        if !self.mounted.insert(identifier.to_string()) {
            return Err(GatewayError::DuplicateRoute {
                kind: self.child_kind,
                name: identifier.to_string(),
            });
        }

        self.fragment.merge(namespace(identifier, child.fragment));
        self.router = self.router.nest(&format!("/{identifier}"), child.router);
        Ok(self)
    }

    fn finish(self) -> RouteNode {
        RouteNode {
            router: self.router,
            fragment: self.fragment,
        }
    }
}

/// Build the complete route tree and document from the ledger.
///
/// Runs strictly sequentially and fails on the first error, so a partially
/// built tree is never served.
pub async fn synthesize(backend: Arc<dyn LedgerBackend>) -> GatewayResult<RouteNode> {
    let networks = backend
        .list_networks()
        .await
        .map_err(|source| GatewayError::Directory {
            level: "network",
            source,
        })?;

    let mut root = Level::new("network", Fragment::empty_document());
    for network in &networks {
        validate_identifier("network", network)?;
        if RESERVED_SEGMENTS.contains(&network.as_str()) {
            return Err(GatewayError::InvalidIdentifier {
                kind: "network",
                name: network.clone(),
                reason: "collides with a service endpoint",
            });
        }

        let child = synthesize_network(&backend, network).await?;
        root = root.mount(network, child)?;
    }

    let node = root.finish();
    tracing::info!(
        networks = networks.len(),
        paths = node.fragment.path_count(),
        schemas = node.fragment.schema_count(),
        "Route tree synthesized"
    );
    Ok(node)
}

async fn synthesize_network(
    backend: &Arc<dyn LedgerBackend>,
    network: &str,
) -> GatewayResult<RouteNode> {
    let contract_groups = backend
        .list_contract_groups(network)
        .await
        .map_err(|source| GatewayError::Directory {
            level: "contract group",
            source,
        })?;

    let mut level = Level::new("contract group", Fragment::empty_document());
    for contract_group in &contract_groups {
        validate_identifier("contract group", contract_group)?;
        let child = synthesize_contract_group(backend, network, contract_group).await?;
        level = level.mount(contract_group, child)?;
    }

    tracing::info!(
        network = %network,
        contract_groups = contract_groups.len(),
        "Network mounted"
    );
    Ok(level.finish())
}

async fn synthesize_contract_group(
    backend: &Arc<dyn LedgerBackend>,
    network: &str,
    contract_group: &str,
) -> GatewayResult<RouteNode> {
    let metadata = backend
        .fetch_metadata(network, contract_group)
        .await
        .map_err(|source| GatewayError::MetadataFetch {
            network: network.to_string(),
            contract_group: contract_group.to_string(),
            source,
        })?;

    tracing::info!(
        network = %network,
        contract_group = %contract_group,
        contracts = metadata.contracts.len(),
        operations = metadata.operation_count(),
        "Contract metadata loaded"
    );

    let fragment = Fragment {
        paths: Some(BTreeMap::new()),
        components: Some(Components::from(metadata.components)),
    };
    let tags = vec![format!("{network}/{contract_group}")];

    let mut level = Level::new("contract", fragment);
    for (identifier, contract) in &metadata.contracts {
        validate_identifier("contract", identifier)?;
        let child = synthesize_contract(backend, network, contract_group, contract, &tags)?;
        level = level.mount(identifier, child)?;
    }
    Ok(level.finish())
}

fn synthesize_contract(
    backend: &Arc<dyn LedgerBackend>,
    network: &str,
    contract_group: &str,
    contract: &ContractDescriptor,
    tags: &[String],
) -> GatewayResult<RouteNode> {
    let mut router = Router::new();
    let mut paths = BTreeMap::new();

    for operation in &contract.operations {
        validate_identifier("operation", &operation.name)?;
        let path = format!("/{}", operation.name);
        if paths.contains_key(&path) {
            return Err(GatewayError::DuplicateRoute {
                kind: "operation",
                name: format!("{}.{}", contract.name, operation.name),
            });
        }

        if operation.returns.is_some() {
            tracing::debug!(
                contract = %contract.name,
                operation = %operation.name,
                "Return schema is not published in the document"
            );
        }

        let target = TransactionTarget {
            network: network.to_string(),
            contract_group: contract_group.to_string(),
            contract: contract.name.clone(),
            operation: operation.name.clone(),
        };
        let dispatcher = Arc::new(OperationDispatcher::new(
            Arc::clone(backend),
            target,
            operation,
        ));
        tracing::debug!(
            contract = %contract.name,
            operation = %operation.name,
            mode = %dispatcher.mode(),
            "Operation route created"
        );

        router = router.route(
            &path,
            post(handlers::invoke_operation).with_state(dispatcher),
        );
        paths.insert(
            path,
            PathItem {
                post: OperationEntry::for_operation(operation, tags.to_vec()),
            },
        );
    }

    Ok(RouteNode {
        router,
        fragment: Fragment {
            paths: Some(paths),
            components: contract.components.clone().map(Components::from),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InvocationMode;
    use crate::ledger::mock::MockLedger;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn two_contract_metadata() -> Value {
        json!({
            "contracts": {
                "A": {
                    "name": "A",
                    "transactions": [{
                        "name": "op1",
                        "parameters": [{ "name": "x", "schema": { "type": "string" } }]
                    }],
                    "components": {
                        "schemas": {
                            "Car": {
                                "type": "object",
                                "properties": {
                                    "owner": { "$ref": "#/components/schemas/Person" },
                                    "registry": { "$ref": "#/components/schemas/Registry" }
                                }
                            },
                            "Person": { "type": "object", "properties": { "name": { "type": "string" } } }
                        }
                    }
                },
                "B": {
                    "name": "B",
                    "transactions": [{
                        "name": "op2",
                        "tag": ["submitTx"],
                        "parameters": [{ "name": "person", "schema": { "$ref": "#/components/schemas/Person" } }]
                    }],
                    "components": {
                        "schemas": {
                            "Person": { "type": "string" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Registry": {
                        "$id": "Registry",
                        "type": "object",
                        "properties": { "cars": { "type": "array", "items": { "$ref": "#/components/schemas/Car" } } }
                    },
                    "Car": { "type": "object", "properties": { "make": { "type": "string" } } }
                }
            }
        })
    }

    fn backend() -> Arc<MockLedger> {
        Arc::new(
            MockLedger::new()
                .with_contract_group("net", "group", two_contract_metadata())
                .respond_with(br#"{"a":1}"#.to_vec()),
        )
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .method(Method::POST)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_document_paths_and_schemas() {
        crate::logging::init_test();
        let node = synthesize(backend()).await.unwrap();
        let document = serde_json::to_value(&node.fragment).unwrap();

        let paths: Vec<_> = document["paths"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(paths, vec!["/net/group/A/op1", "/net/group/B/op2"]);

        let schemas = document["components"]["schemas"].as_object().unwrap();
        let mut names: Vec<_> = schemas.keys().cloned().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "net.group.A.Car",
                "net.group.A.Person",
                "net.group.B.Person",
                "net.group.Car",
                "net.group.Registry",
            ]
        );

        // contract-scoped refs resolve inside the contract, others to the group
        let car = &schemas["net.group.A.Car"]["properties"];
        assert_eq!(car["owner"]["$ref"], "#/components/schemas/net.group.A.Person");
        assert_eq!(car["registry"]["$ref"], "#/components/schemas/net.group.Registry");
        assert_eq!(
            schemas["net.group.Registry"]["properties"]["cars"]["items"]["$ref"],
            "#/components/schemas/net.group.Car"
        );
        assert!(schemas["net.group.Registry"].get("$id").is_none());

        let op2 = &document["paths"]["/net/group/B/op2"]["post"];
        assert_eq!(op2["operationId"], "op2");
        assert_eq!(op2["tags"], json!(["net/group"]));
        assert_eq!(
            op2["requestBody"]["content"]["application/json"]["schema"]["properties"]["person"]["$ref"],
            "#/components/schemas/net.group.B.Person"
        );
    }

    #[tokio::test]
    async fn test_cross_contract_refs_are_repointed() {
        let backend = Arc::new(MockLedger::new().with_contract_group(
            "net",
            "group",
            json!({
                "contracts": {
                    "A": {
                        "name": "A",
                        "transactions": [{ "name": "op1" }],
                        "components": {
                            "schemas": {
                                "Car": {
                                    "type": "object",
                                    "properties": { "driver": { "$ref": "#/components/schemas/B.Person" } }
                                }
                            }
                        }
                    },
                    "B": {
                        "name": "B",
                        "transactions": [{
                            "name": "op2",
                            "parameters": [{ "name": "car", "schema": { "$ref": "#/components/schemas/A.Car" } }]
                        }],
                        "components": {
                            "schemas": {
                                "Person": {
                                    "type": "object",
                                    "properties": { "car": { "$ref": "#/components/schemas/A.Car" } }
                                }
                            }
                        }
                    }
                }
            }),
        ));

        let node = synthesize(backend).await.unwrap();
        let document = serde_json::to_value(&node.fragment).unwrap();
        let schemas = &document["components"]["schemas"];

        assert_eq!(
            schemas["net.group.A.Car"]["properties"]["driver"]["$ref"],
            "#/components/schemas/net.group.B.Person"
        );
        assert_eq!(
            schemas["net.group.B.Person"]["properties"]["car"]["$ref"],
            "#/components/schemas/net.group.A.Car"
        );
        assert_eq!(
            document["paths"]["/net/group/B/op2"]["post"]["requestBody"]["content"]["application/json"]
                ["schema"]["properties"]["car"]["$ref"],
            "#/components/schemas/net.group.A.Car"
        );
    }

    #[tokio::test]
    async fn test_network_level_fragment_is_group_qualified() {
        let backend: Arc<dyn LedgerBackend> = backend();
        let node = synthesize_network(&backend, "net").await.unwrap();

        let components = node.fragment.components.unwrap();
        assert!(components.schemas.contains_key("group.A.Car"));
        assert!(components.schemas.contains_key("group.B.Person"));
        assert!(node.fragment.paths.unwrap().contains_key("/group/A/op1"));
    }

    #[tokio::test]
    async fn test_routes_dispatch_to_backend() {
        let backend = backend();
        let node = synthesize(backend.clone()).await.unwrap();

        let (status, body) =
            post_json(node.router.clone(), "/net/group/A/op1", json!({ "x": "hello" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({ "a": 1 }));

        let (status, _) = post_json(
            node.router.clone(),
            "/net/group/B/op2",
            json!({ "person": { "name": "Ann" } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].mode, InvocationMode::Evaluate);
        assert_eq!(calls[0].target.to_string(), "net/group/A/op1");
        assert_eq!(calls[0].args, vec!["hello"]);
        assert_eq!(calls[1].mode, InvocationMode::Submit);
        assert_eq!(calls[1].target.function_name(), "B:op2");
        assert_eq!(calls[1].args, vec![r#"{"name":"Ann"}"#]);

        let (status, _) = post_json(node.router, "/net/group/A/missing", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metadata_failure_is_fatal() {
        let backend = Arc::new(MockLedger::new().with_contract_group(
            "net",
            "group",
            json!({ "components": { "schemas": {} } }),
        ));

        let err = synthesize(backend).await.err().unwrap();
        assert!(matches!(err, GatewayError::MetadataFetch { .. }));
        assert!(err.to_string().contains("net/group"));
    }

    #[tokio::test]
    async fn test_identifier_with_slash_rejected() {
        let backend = Arc::new(MockLedger::new().with_contract_group(
            "net",
            "group",
            json!({ "contracts": { "a/b": { "name": "a/b", "transactions": [] } } }),
        ));

        let err = synthesize(backend).await.err().unwrap();
        assert!(matches!(
            err,
            GatewayError::InvalidIdentifier { kind: "contract", .. }
        ));
    }

    #[tokio::test]
    async fn test_reserved_network_rejected() {
        let backend = Arc::new(MockLedger::new().with_contract_group(
            "swagger-ui",
            "group",
            two_contract_metadata(),
        ));

        let err = synthesize(backend).await.err().unwrap();
        assert!(matches!(err, GatewayError::InvalidIdentifier { kind: "network", .. }));
    }

    #[tokio::test]
    async fn test_duplicate_operation_rejected() {
        let backend = Arc::new(MockLedger::new().with_contract_group(
            "net",
            "group",
            json!({
                "contracts": {
                    "A": { "name": "A", "transactions": [{ "name": "op" }, { "name": "op" }] }
                }
            }),
        ));

        let err = synthesize(backend).await.err().unwrap();
        assert_eq!(err.to_string(), "Duplicate operation `A.op`");
    }

    #[tokio::test]
    async fn test_duplicate_contract_group_rejected() {
        let backend = Arc::new(
            MockLedger::new()
                .with_contract_group("net", "group", two_contract_metadata())
                .with_contract_group("net", "group", two_contract_metadata()),
        );

        let err = synthesize(backend).await.err().unwrap();
        assert!(matches!(err, GatewayError::DuplicateRoute { kind: "contract group", .. }));
    }

    #[tokio::test]
    async fn test_empty_directory_yields_empty_document() {
        let node = synthesize(Arc::new(MockLedger::new())).await.unwrap();
        assert_eq!(
            serde_json::to_value(&node.fragment).unwrap(),
            json!({ "paths": {}, "components": { "schemas": {} } })
        );
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("contract", "FabCar").is_ok());
        assert!(validate_identifier("contract", "org.hyperledger.fabric").is_ok());
        assert!(validate_identifier("contract", "").is_err());
        assert!(validate_identifier("contract", "a/b").is_err());
        assert!(validate_identifier("contract", ":id").is_err());
        assert!(validate_identifier("contract", "*rest").is_err());
    }
}
