//! Serializable output records for the seven query operations. The
//! transport layer serializes these as-is; the core never does framing.

use serde::Serialize;

use crate::index::{Endpoint, SchemaEntry};
use crate::model::SchemaKind;
use crate::resolve::ResolvedSchema;

/// Result of a successful `load_swagger`.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub source: String,
    pub title: String,
    pub version: String,
    pub spec_version: &'static str,
    pub operation_count: usize,
    pub schema_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub source: String,
    pub title: String,
    pub version: String,
    pub spec_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub operation_count: usize,
    pub schema_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointSummary {
    pub id: String,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl EndpointSummary {
    pub fn from_endpoint(endpoint: &Endpoint) -> Self {
        let op = &endpoint.operation;
        EndpointSummary {
            id: endpoint.id.clone(),
            method: endpoint.method.clone(),
            path: endpoint.path.clone(),
            summary: op.summary.clone(),
            description: op.description.clone(),
            tags: op.tags.clone(),
            deprecated: op.deprecated,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterDetail {
    pub name: String,
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ResolvedSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestBodyDetail {
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ResolvedSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseDetail {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ResolvedSchema>,
}

/// An endpoint with parameters, request body, and responses dereferenced.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointDetails {
    #[serde(flatten)]
    pub endpoint: EndpointSummary,
    pub parameters: Vec<ParameterDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyDetail>,
    pub responses: Vec<ResponseDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaSummary {
    pub name: String,
    pub kind: SchemaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub property_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl SchemaSummary {
    pub fn from_entry(entry: &SchemaEntry) -> Self {
        SchemaSummary {
            name: entry.name.clone(),
            kind: entry.kind,
            description: entry.description.clone(),
            property_count: entry.property_names.len(),
            required: entry.required.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaDetails {
    pub name: String,
    pub kind: SchemaKind,
    pub schema: ResolvedSchema,
}

/// One ranked search match. Exactly one of `endpoint`/`schema` is set,
/// depending on the search scope.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub rank: usize,
    pub matched_field: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaSummary>,
}
