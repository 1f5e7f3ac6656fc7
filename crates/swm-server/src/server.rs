//! MCP tool surface over the query service: seven read-mostly tools, one
//! mutating `load_swagger`. Results are pretty-printed JSON strings;
//! failures surface as plain error messages the client can act on.

use std::sync::Arc;

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::Deserialize;

use swm_core::QueryService;

#[derive(Clone)]
pub struct SwaggerServer {
    service: Arc<QueryService>,
    tool_router: ToolRouter<Self>,
}

impl SwaggerServer {
    pub fn new(service: Arc<QueryService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to serialize result: {e}"))
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadSwaggerRequest {
    #[schemars(description = "Document source: HTTP(S) URL or local file path (JSON or YAML)")]
    pub source: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListApisRequest {
    #[schemars(description = "Filter by tag")]
    pub tag: Option<String>,
    #[schemars(description = "Filter by HTTP method (GET, POST, ...)")]
    pub method: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetApiDetailsRequest {
    #[schemars(description = "Operation id, or `METHOD path` for operations without one")]
    pub operation_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchApisRequest {
    #[schemars(description = "Search query (case-insensitive substring)")]
    pub query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetSchemaDetailsRequest {
    #[schemars(description = "Schema name")]
    pub name: String,
}

#[tool_router]
impl SwaggerServer {
    #[tool(
        description = "Load an OpenAPI/Swagger document (v2 or v3, JSON or YAML) from a URL or file path and make it the current document."
    )]
    async fn load_swagger(
        &self,
        Parameters(req): Parameters<LoadSwaggerRequest>,
    ) -> Result<String, String> {
        let summary = self
            .service
            .load_swagger(&req.source)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&summary)
    }

    #[tool(description = "Get title, version, base URL, and counts for the current document.")]
    async fn get_swagger_info(&self) -> Result<String, String> {
        let info = self
            .service
            .get_swagger_info()
            .await
            .map_err(|e| e.to_string())?;
        to_json(&info)
    }

    #[tool(description = "List API endpoints, optionally filtered by tag and/or HTTP method.")]
    async fn list_apis(
        &self,
        Parameters(req): Parameters<ListApisRequest>,
    ) -> Result<String, String> {
        let apis = self
            .service
            .list_apis(req.tag.as_deref(), req.method.as_deref())
            .await
            .map_err(|e| e.to_string())?;
        to_json(&apis)
    }

    #[tool(
        description = "Get one endpoint by operation id, with parameters and responses fully resolved."
    )]
    async fn get_api_details(
        &self,
        Parameters(req): Parameters<GetApiDetailsRequest>,
    ) -> Result<String, String> {
        let details = self
            .service
            .get_api_details(&req.operation_id)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&details)
    }

    #[tool(
        description = "Search endpoints by path, operation id, summary, description, or tags. Ranked: exact > prefix > elsewhere."
    )]
    async fn search_apis(
        &self,
        Parameters(req): Parameters<SearchApisRequest>,
    ) -> Result<String, String> {
        let results = self
            .service
            .search_apis(&req.query)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&results)
    }

    #[tool(description = "List all schema definitions with their kinds.")]
    async fn list_schemas(&self) -> Result<String, String> {
        let schemas = self
            .service
            .list_schemas()
            .await
            .map_err(|e| e.to_string())?;
        to_json(&schemas)
    }

    #[tool(
        description = "Get one schema by name with property types resolved; cyclic references are marked, not expanded."
    )]
    async fn get_schema_details(
        &self,
        Parameters(req): Parameters<GetSchemaDetailsRequest>,
    ) -> Result<String, String> {
        let details = self
            .service
            .get_schema_details(&req.name)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&details)
    }
}

impl ServerHandler for SwaggerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "swagger-mcp".into(),
                title: Some("Swagger MCP - OpenAPI document query tools".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Query a loaded OpenAPI/Swagger document: endpoint listing and search, \
                 endpoint details, schema listing and details with resolved references. \
                 Call load_swagger first unless a default source is configured."
                    .into(),
            ),
        }
    }
}
