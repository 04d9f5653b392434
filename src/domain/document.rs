//! Interface document (OpenAPI 3.0) types.
//!
//! Only the subset the gateway emits is modelled: POST operations with a JSON
//! request body, a fixed success response, and shared schema definitions.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ComponentMetadata, OperationDescriptor, SchemaNode};

pub const OPENAPI_VERSION: &str = "3.0.0";

const JSON_MEDIA_TYPE: &str = "application/json";

/// Schema definitions section of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaNode>,
}

impl From<ComponentMetadata> for Components {
    fn from(metadata: ComponentMetadata) -> Self {
        let schemas = metadata
            .schemas
            .into_iter()
            .map(|(name, mut schema)| {
                schema.strip_id();
                (name, schema)
            })
            .collect();
        Components { schemas }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: SchemaNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub description: String,
}

/// One documented operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationEntry {
    pub operation_id: String,
    pub request_body: RequestBody,
    pub responses: BTreeMap<String, ResponseEntry>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl OperationEntry {
    /// Document entry for a contract operation.
    ///
    /// Declared parameters become properties of an object request body with no
    /// `required` list. The response is a bare success stub; the operation's
    /// `returns` schema is not published.
    pub fn for_operation(operation: &OperationDescriptor, tags: Vec<String>) -> Self {
        let properties = operation
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.schema.clone()))
            .collect();

        let mut content = BTreeMap::new();
        content.insert(
            JSON_MEDIA_TYPE.to_string(),
            MediaType {
                schema: SchemaNode::object(properties),
            },
        );

        let mut responses = BTreeMap::new();
        responses.insert(
            "200".to_string(),
            ResponseEntry {
                description: "successful operation".to_string(),
            },
        );

        Self {
            operation_id: operation.name.clone(),
            request_body: RequestBody { content },
            responses,
            tags,
        }
    }

    pub fn schemas_mut(&mut self) -> impl Iterator<Item = &mut SchemaNode> {
        self.request_body.content.values_mut().map(|m| &mut m.schema)
    }
}

/// Everything documented under a single route path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    pub post: OperationEntry,
}

/// A partial interface document produced by one subtree of the route tree.
///
/// Both sections are optional: a fragment that never had a section does not
/// grow an empty one when it is namespaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<BTreeMap<String, PathItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl Fragment {
    /// A fragment with both sections present and empty.
    pub fn empty_document() -> Self {
        Self {
            paths: Some(BTreeMap::new()),
            components: Some(Components::default()),
        }
    }

    /// Fold `other` into this fragment. Later keys overwrite earlier ones.
    pub fn merge(&mut self, other: Fragment) {
        if let Some(paths) = other.paths {
            self.paths.get_or_insert_with(BTreeMap::new).extend(paths);
        }
        if let Some(components) = other.components {
            self.components
                .get_or_insert_with(Components::default)
                .schemas
                .extend(components.schemas);
        }
    }

    /// Every schema in the fragment: definitions and request bodies.
    pub fn schemas_mut(&mut self) -> impl Iterator<Item = &mut SchemaNode> {
        let definitions = self
            .components
            .iter_mut()
            .flat_map(|c| c.schemas.values_mut());
        let bodies = self
            .paths
            .iter_mut()
            .flat_map(|paths| paths.values_mut())
            .flat_map(|item| item.post.schemas_mut());
        definitions.chain(bodies)
    }

    pub fn path_count(&self) -> usize {
        self.paths.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn schema_count(&self) -> usize {
        self.components.as_ref().map_or(0, |c| c.schemas.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// The merged document served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(flatten)]
    pub fragment: Fragment,
}

impl ApiDocument {
    pub fn new(info: Info, fragment: Fragment) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info,
            fragment,
        }
    }

    /// Write the document as pretty-printed JSON, replacing any existing file.
    pub async fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let rendered = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, rendered).await
    }
}
