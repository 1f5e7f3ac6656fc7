//! The public contract layer: seven operations over the current document.
//!
//! A load builds the document and its index completely before publishing;
//! the swap is the only write and happens under a narrow lock section, so
//! readers either see the old pair or the new one, never a half-built
//! index. On any load failure the previous document stays current.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{info, warn};

use crate::error::QueryError;
use crate::index::{DocumentIndex, Endpoint, SearchHit, SearchScope};
use crate::loader::{DocumentLoader, DocumentSource};
use crate::model::{Document, ParameterOrRef, RequestBody, RequestBodyOrRef, ResponseOrRef};
use crate::normalize::normalize;
use crate::records::{
    DocumentInfo, EndpointDetails, EndpointSummary, LoadSummary, ParameterDetail,
    RequestBodyDetail, ResponseDetail, SchemaDetails, SchemaSummary, SearchResult,
};
use crate::resolve::{ResolvedSchema, Resolver};

/// An immutable document/index pair, published atomically.
#[derive(Debug)]
pub struct LoadedDocument {
    pub document: Document,
    pub index: DocumentIndex,
}

pub struct QueryService {
    loader: DocumentLoader,
    default_source: Option<String>,
    current: RwLock<Option<Arc<LoadedDocument>>>,
}

impl QueryService {
    pub fn new(default_source: Option<String>, timeout: Duration) -> Self {
        Self {
            loader: DocumentLoader::new(timeout),
            default_source,
            current: RwLock::new(None),
        }
    }

    /// Load a document from a URI or file path and make it current.
    /// Atomic: on any stage error the previous document is untouched.
    pub async fn load_swagger(&self, source: &str) -> Result<LoadSummary, QueryError> {
        let loaded = Arc::new(self.build(source).await?);
        let summary = summarize(&loaded);
        self.publish(loaded);
        info!(
            "loaded {} ({} operations, {} schemas) from {source}",
            summary.title, summary.operation_count, summary.schema_count
        );
        Ok(summary)
    }

    pub async fn get_swagger_info(&self) -> Result<DocumentInfo, QueryError> {
        let loaded = self.current().await?;
        let doc = &loaded.document;
        Ok(DocumentInfo {
            source: doc.source.clone(),
            title: doc.title().to_string(),
            version: doc.api_version().to_string(),
            spec_version: doc.version.as_str(),
            description: doc.spec.info.description.clone(),
            base_url: doc.base_url().map(str::to_string),
            operation_count: loaded.index.endpoints().len(),
            schema_count: loaded.index.schemas().len(),
        })
    }

    /// All endpoints in declaration order, optionally filtered by tag
    /// and/or HTTP method (both case-insensitive).
    pub async fn list_apis(
        &self,
        tag: Option<&str>,
        method: Option<&str>,
    ) -> Result<Vec<EndpointSummary>, QueryError> {
        let loaded = self.current().await?;
        let method = method.map(str::to_uppercase);

        let endpoints: Vec<&Endpoint> = match tag {
            Some(tag) => loaded.index.operations_by_tag(tag),
            None => loaded.index.endpoints().iter().collect(),
        };

        Ok(endpoints
            .into_iter()
            .filter(|e| method.as_deref().is_none_or(|m| e.method == m))
            .map(EndpointSummary::from_endpoint)
            .collect())
    }

    /// One endpoint by operation id, with parameters and responses fully
    /// resolved. Dangling references surface as inline markers.
    pub async fn get_api_details(&self, operation_id: &str) -> Result<EndpointDetails, QueryError> {
        let loaded = self.current().await?;
        let endpoint = loaded
            .index
            .operation_by_id(operation_id)
            .ok_or_else(|| QueryError::OperationNotFound(operation_id.to_string()))?;

        let mut resolver = Resolver::new(&loaded.document);
        let op = &endpoint.operation;

        let parameters = op
            .parameters
            .iter()
            .map(|p| parameter_detail(&mut resolver, p))
            .collect();

        let request_body = op
            .request_body
            .as_ref()
            .map(|body| request_body_detail(&mut resolver, body));

        let responses = op
            .responses
            .iter()
            .map(|(status, response)| response_detail(&mut resolver, status, response))
            .collect();

        Ok(EndpointDetails {
            endpoint: EndpointSummary::from_endpoint(endpoint),
            parameters,
            request_body,
            responses,
        })
    }

    pub async fn search_apis(&self, query: &str) -> Result<Vec<SearchResult>, QueryError> {
        let loaded = self.current().await?;
        Ok(collect_results(loaded.index.search(query, SearchScope::Apis)))
    }

    pub async fn search_schemas(&self, query: &str) -> Result<Vec<SearchResult>, QueryError> {
        let loaded = self.current().await?;
        Ok(collect_results(
            loaded.index.search(query, SearchScope::Schemas),
        ))
    }

    pub async fn list_schemas(&self) -> Result<Vec<SchemaSummary>, QueryError> {
        let loaded = self.current().await?;
        Ok(loaded
            .index
            .schemas()
            .iter()
            .map(SchemaSummary::from_entry)
            .collect())
    }

    /// One schema by name, with property types resolved and cycles marked.
    pub async fn get_schema_details(&self, name: &str) -> Result<SchemaDetails, QueryError> {
        let loaded = self.current().await?;
        let entry = loaded
            .index
            .schema_entry(name)
            .ok_or_else(|| QueryError::SchemaNotFound(name.to_string()))?;

        let mut resolver = Resolver::new(&loaded.document);
        let schema = resolver
            .resolve_named_schema(name)
            .ok_or_else(|| QueryError::SchemaNotFound(name.to_string()))?;

        Ok(SchemaDetails {
            name: entry.name.clone(),
            kind: entry.kind,
            schema,
        })
    }

    async fn build(&self, source: &str) -> Result<LoadedDocument, QueryError> {
        let source = DocumentSource::parse(source);
        let tree = self.loader.load(&source).await?;
        let document = normalize(tree, &source.as_str())?;
        let index = DocumentIndex::build(&document);
        Ok(LoadedDocument { document, index })
    }

    fn publish(&self, loaded: Arc<LoadedDocument>) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(loaded);
    }

    /// The current document, lazily loading the default source on first
    /// use. Fails with `NoDocumentLoaded` when neither exists.
    async fn current(&self) -> Result<Arc<LoadedDocument>, QueryError> {
        {
            let guard = self
                .current
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(loaded) = guard.as_ref() {
                return Ok(loaded.clone());
            }
        }

        let Some(default) = self.default_source.as_deref() else {
            return Err(QueryError::NoDocumentLoaded);
        };

        info!("no document loaded, loading default source {default}");
        let loaded = Arc::new(self.build(default).await?);

        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_ref() {
            // Another load won the race; keep it.
            Some(existing) => Ok(existing.clone()),
            None => {
                *guard = Some(loaded.clone());
                Ok(loaded)
            }
        }
    }
}

fn summarize(loaded: &LoadedDocument) -> LoadSummary {
    LoadSummary {
        source: loaded.document.source.clone(),
        title: loaded.document.title().to_string(),
        version: loaded.document.api_version().to_string(),
        spec_version: loaded.document.version.as_str(),
        operation_count: loaded.index.endpoints().len(),
        schema_count: loaded.index.schemas().len(),
        warnings: loaded.index.warnings().to_vec(),
    }
}

fn collect_results(hits: Vec<SearchHit<'_>>) -> Vec<SearchResult> {
    hits.into_iter()
        .enumerate()
        .map(|(position, hit)| match hit {
            SearchHit::Endpoint {
                endpoint,
                matched_field,
            } => SearchResult {
                rank: position + 1,
                matched_field,
                endpoint: Some(EndpointSummary::from_endpoint(endpoint)),
                schema: None,
            },
            SearchHit::Schema {
                entry,
                matched_field,
            } => SearchResult {
                rank: position + 1,
                matched_field,
                endpoint: None,
                schema: Some(SchemaSummary::from_entry(entry)),
            },
        })
        .collect()
}

fn parameter_detail(resolver: &mut Resolver<'_>, node: &ParameterOrRef) -> ParameterDetail {
    match node {
        ParameterOrRef::Parameter(param) => ParameterDetail {
            name: param.name.clone(),
            location: param.location.as_str().to_string(),
            required: param.required,
            description: param.description.clone(),
            schema: param
                .schema
                .as_ref()
                .map(|s| resolver.resolve_schema_or_ref(s)),
        },
        ParameterOrRef::Ref { ref_path } => match resolver.lookup_parameter(ref_path) {
            Ok(param) => ParameterDetail {
                name: param.name.clone(),
                location: param.location.as_str().to_string(),
                required: param.required,
                description: param.description.clone(),
                schema: param
                    .schema
                    .as_ref()
                    .map(|s| resolver.resolve_schema_or_ref(s)),
            },
            Err(err) => {
                warn!("parameter reference failed: {err}");
                ParameterDetail {
                    name: ref_path.clone(),
                    location: "unknown".to_string(),
                    required: false,
                    description: None,
                    schema: Some(ResolvedSchema::unresolved(ref_path)),
                }
            }
        },
    }
}

fn request_body_detail(resolver: &mut Resolver<'_>, node: &RequestBodyOrRef) -> RequestBodyDetail {
    let inline: &RequestBody = match node {
        RequestBodyOrRef::RequestBody(body) => body,
        RequestBodyOrRef::Ref { ref_path } => match resolver.lookup_request_body(ref_path) {
            Ok(body) => body,
            Err(err) => {
                warn!("request body reference failed: {err}");
                return RequestBodyDetail {
                    required: false,
                    description: None,
                    content_type: None,
                    schema: Some(ResolvedSchema::unresolved(ref_path)),
                };
            }
        },
    };

    let (content_type, schema) = first_content(resolver, &inline.content);
    RequestBodyDetail {
        required: inline.required,
        description: inline.description.clone(),
        content_type,
        schema,
    }
}

fn response_detail(
    resolver: &mut Resolver<'_>,
    status: &str,
    node: &ResponseOrRef,
) -> ResponseDetail {
    let inline = match node {
        ResponseOrRef::Response(response) => response,
        ResponseOrRef::Ref { ref_path } => match resolver.lookup_response(ref_path) {
            Ok(response) => response,
            Err(err) => {
                warn!("response reference failed: {err}");
                return ResponseDetail {
                    status: status.to_string(),
                    description: None,
                    content_type: None,
                    schema: Some(ResolvedSchema::unresolved(ref_path)),
                };
            }
        },
    };

    let (content_type, schema) = first_content(resolver, &inline.content);
    ResponseDetail {
        status: status.to_string(),
        description: (!inline.description.is_empty()).then(|| inline.description.clone()),
        content_type,
        schema,
    }
}

/// First media type entry wins, `application/json` preferred.
fn first_content(
    resolver: &mut Resolver<'_>,
    content: &indexmap::IndexMap<String, crate::model::MediaType>,
) -> (Option<String>, Option<ResolvedSchema>) {
    let entry = content
        .get_key_value("application/json")
        .or_else(|| content.first());
    match entry {
        Some((content_type, media)) => (
            Some(content_type.clone()),
            media
                .schema
                .as_ref()
                .map(|s| resolver.resolve_schema_or_ref(s)),
        ),
        None => (None, None),
    }
}
