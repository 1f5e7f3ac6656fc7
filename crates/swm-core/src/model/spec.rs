use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::operation::{Operation, ParameterOrRef, RequestBodyOrRef, ResponseOrRef};
use super::schema::SchemaOrRef;

/// Which spec dialect the source document declared. Canonical trees are
/// always 3.x-shaped; this tag only records provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecVersion {
    #[serde(rename = "2.0")]
    V2,
    #[serde(rename = "3.x")]
    V3,
}

impl SpecVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V2 => "2.0",
            SpecVersion::V3 => "3.x",
        }
    }
}

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A server URL definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reusable component definitions, keyed by name in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, ParameterOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ResponseOrRef>,

    #[serde(
        rename = "requestBodies",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub request_bodies: IndexMap<String, RequestBodyOrRef>,
}

/// The canonical tree produced by normalization. Path items are flattened
/// to `path -> lowercase method -> operation`, with path-level parameters
/// already merged into each operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalSpec {
    #[serde(default)]
    pub info: Info,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, IndexMap<String, Operation>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl CanonicalSpec {
    pub fn schemas(&self) -> Option<&IndexMap<String, SchemaOrRef>> {
        self.components.as_ref().map(|c| &c.schemas)
    }
}

/// A loaded, normalized OpenAPI document. Owns its canonical tree
/// exclusively; everything downstream reads it immutably.
#[derive(Debug, Clone)]
pub struct Document {
    /// URI or path the document was loaded from.
    pub source: String,
    pub version: SpecVersion,
    /// The verbatim `swagger`/`openapi` version string from the source.
    pub declared_version: String,
    pub spec: CanonicalSpec,
}

impl Document {
    pub fn title(&self) -> &str {
        &self.spec.info.title
    }

    pub fn api_version(&self) -> &str {
        &self.spec.info.version
    }

    pub fn base_url(&self) -> Option<&str> {
        self.spec.servers.first().map(|s| s.url.as_str())
    }

    pub fn schemas(&self) -> Option<&IndexMap<String, SchemaOrRef>> {
        self.spec.schemas()
    }

    pub fn schema_count(&self) -> usize {
        self.schemas().map_or(0, |s| s.len())
    }

    pub fn operation_count(&self) -> usize {
        self.spec.paths.values().map(|item| item.len()).sum()
    }
}
