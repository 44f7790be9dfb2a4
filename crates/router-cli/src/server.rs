//! MCP `ServerHandler` adapter: the only place in this crate that speaks
//! `rmcp`'s wire types. Translates `RouterFacade` calls to/from MCP shapes.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool as RmcpTool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};

use router_core::facade::{RouterFacade, ToolDescriptor};
use router_core::{ContentItem, RouterError};

/// Wraps a `RouterFacade` behind `rmcp`'s `ServerHandler` trait.
pub struct RouterServerHandler {
    facade: Arc<RouterFacade>,
}

impl RouterServerHandler {
    pub fn new(facade: Arc<RouterFacade>) -> Self {
        RouterServerHandler { facade }
    }
}

fn descriptor_to_rmcp_tool(descriptor: &ToolDescriptor) -> RmcpTool {
    let schema_value = descriptor.input_schema.to_value();
    let schema_map = schema_value.as_object().cloned().unwrap_or_default();
    RmcpTool {
        name: Cow::Owned(descriptor.name.clone()),
        title: None,
        description: Some(Cow::Owned(descriptor.description.clone())),
        input_schema: Arc::new(schema_map),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: Default::default(),
    }
}

fn content_item_to_rmcp(item: &ContentItem) -> Content {
    match item {
        ContentItem::Text { text } => Content::text(text.clone()),
        ContentItem::Image { data, mime_type } => Content::image(data.clone(), mime_type.clone()),
        ContentItem::Resource { resource } => {
            // No corpus example constructs a typed embedded-resource Content
            // server-side; surface the resource's text (or its raw JSON for
            // blob resources) rather than silently dropping it.
            let text = resource
                .get("text")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| resource.to_string());
            Content::text(text)
        }
    }
}

fn router_error_to_mcp(err: RouterError) -> McpError {
    match err {
        RouterError::ToolNotFound { message, .. } => McpError::invalid_params(message, None),
        RouterError::Validation { message, .. } => McpError::invalid_params(message, None),
        RouterError::Configuration { message, .. } => McpError::invalid_request(message, None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

impl ServerHandler for RouterServerHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "semantic-mcp-router".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Semantic search router over MCP tool-calling upstreams. Call `search_tools` \
                 with a natural-language query to find relevant tools beyond the default set, \
                 `load_upstream`/`unload_upstream` to manage which upstreams are connected."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _pagination: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let descriptors = self.facade.list_default_tools().await;
        let tools = descriptors.iter().map(descriptor_to_rmcp_tool).collect();
        Ok(ListToolsResult { tools, meta: Default::default(), next_cursor: None })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = serde_json::Value::Object(request.arguments.unwrap_or_default());
        let result = self
            .facade
            .call_tool(request.name.as_ref(), arguments)
            .await
            .map_err(router_error_to_mcp)?;

        Ok(CallToolResult {
            content: result.content.iter().map(content_item_to_rmcp).collect(),
            structured_content: None,
            is_error: Some(result.is_error),
            meta: Default::default(),
        })
    }
}
