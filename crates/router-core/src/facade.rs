//! Router Facade: the five entry points an MCP server adapter calls into,
//! as a plain struct with no protocol dependency of its own.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::catalog::EmbeddingIndex;
use crate::discovery::DiscoveryManager;
use crate::embedding_model::EmbeddingModel;
use crate::error::{RouterError, Result};
use crate::proxy::ToolCallProxy;
use crate::sanitize::combine_query_and_context;
use crate::types::{ContentItem, JsonSchema, RouterConfig, ToolCallResult, ToolMetadata};
use crate::validation::{validate_search_query, validate_tool_parameters};

/// Tools returned in `list_default_tools` beyond the semantically-selected
/// default subset: the three meta-tools are always present.
const DEFAULT_SUBSET_MAX: usize = 20;
const SEARCH_TOP_K: usize = 10;

/// A tool description in the shape an MCP adapter serializes onto the wire.
/// The facade speaks this instead of `rmcp::model::Tool` directly so
/// `router-core` stays protocol-agnostic.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: JsonSchema,
}

impl From<&ToolMetadata> for ToolDescriptor {
    fn from(tool: &ToolMetadata) -> Self {
        ToolDescriptor {
            name: tool.namespaced_name.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
        }
    }
}

impl ToolDescriptor {
    fn search_tools() -> Self {
        ToolDescriptor {
            name: "search_tools".to_string(),
            description: "Search for relevant tools across all configured MCP upstreams using \
                semantic similarity. Returns the top matching tools with their similarity scores."
                .to_string(),
            input_schema: JsonSchema::from_value(&serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Natural-language description of the desired capability"},
                    "context": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional extra context strings to bias the search"
                    }
                },
                "required": ["query"],
            })),
        }
    }

    fn load_upstream() -> Self {
        ToolDescriptor {
            name: "load_upstream".to_string(),
            description: "Load an MCP upstream server by its configured id or alias, connecting \
                to it and registering its tools in the searchable catalog."
                .to_string(),
            input_schema: JsonSchema::from_value(&serde_json::json!({
                "type": "object",
                "properties": {
                    "upstream": {"type": "string", "description": "Canonical upstream id"},
                    "alias": {"type": "string", "description": "Alias to resolve to an upstream"}
                },
            })),
        }
    }

    fn unload_upstream() -> Self {
        ToolDescriptor {
            name: "unload_upstream".to_string(),
            description: "Unload an MCP upstream server, disconnecting it and removing its tools \
                from the searchable catalog."
                .to_string(),
            input_schema: JsonSchema::from_value(&serde_json::json!({
                "type": "object",
                "properties": {
                    "upstream": {"type": "string", "description": "Canonical upstream id or alias"}
                },
                "required": ["upstream"],
            })),
        }
    }
}

/// The router's protocol-agnostic surface. An MCP `ServerHandler`
/// adapter wraps this and does nothing but translate to/from the wire.
pub struct RouterFacade {
    config: Arc<RouterConfig>,
    index: Arc<EmbeddingIndex>,
    embedding_model: Arc<dyn EmbeddingModel>,
    discovery: Arc<DiscoveryManager>,
    proxy: ToolCallProxy,
}

impl RouterFacade {
    pub fn new(
        config: Arc<RouterConfig>,
        index: Arc<EmbeddingIndex>,
        embedding_model: Arc<dyn EmbeddingModel>,
        discovery: Arc<DiscoveryManager>,
    ) -> Self {
        let proxy = ToolCallProxy::new(config.clone(), discovery.clone());
        RouterFacade { config, index, embedding_model, discovery, proxy }
    }

    /// The diversity-balanced default subset plus
    /// the three always-present meta-tools.
    pub async fn list_default_tools(&self) -> Vec<ToolDescriptor> {
        let subset = self.discovery.default_tool_subset(DEFAULT_SUBSET_MAX).await;
        let mut descriptors: Vec<ToolDescriptor> = subset.iter().map(ToolDescriptor::from).collect();
        descriptors.push(ToolDescriptor::search_tools());
        descriptors.push(ToolDescriptor::load_upstream());
        descriptors.push(ToolDescriptor::unload_upstream());

        info!(tool_count = descriptors.len(), "returning default tool subset");
        descriptors
    }

    /// Sanitize, embed, rank, and format as
    /// human-readable text content (mirrors `_handle_search_tools`).
    pub async fn search_tools(&self, query: Option<&Value>, context: Option<Vec<String>>) -> Result<Vec<ContentItem>> {
        let query_text = validate_search_query(query)?;
        let combined = combine_query_and_context(&query_text, context.as_deref());
        let query_vector = self.embedding_model.embed(&combined).await?;
        let results = self.index.search(&query_vector, SEARCH_TOP_K).await?;

        let top_matches: Vec<Value> = results
            .iter()
            .take(3)
            .map(|r| serde_json::json!({"name": r.tool.namespaced_name, "score": r.similarity}))
            .collect();

        info!(
            query = %query_text,
            context_length = context.as_ref().map(|c| c.len()).unwrap_or(0),
            top_matches = %Value::Array(top_matches),
            results_count = results.len(),
            "search_tools completed"
        );

        let mut text = format!("Found {} relevant tools:\n\n", results.len());
        for (i, result) in results.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} (similarity: {:.4})\n   Description: {}\n",
                i + 1,
                result.tool.namespaced_name,
                result.similarity,
                result.tool.description
            ));
        }

        Ok(vec![ContentItem::Text { text }])
    }

    /// Dispatch the three meta-tools locally, else
    /// validate against the declared schema and forward through the proxy.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        match name {
            "search_tools" => {
                let query = arguments.get("query");
                let context = arguments
                    .get("context")
                    .and_then(Value::as_array)
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect());
                let content = self.search_tools(query, context).await?;
                Ok(ToolCallResult { content, is_error: false })
            }
            "load_upstream" => {
                let upstream = arguments.get("upstream").and_then(Value::as_str);
                let alias = arguments.get("alias").and_then(Value::as_str);
                let content = self.load_upstream(upstream, alias).await?;
                Ok(ToolCallResult { content, is_error: false })
            }
            "unload_upstream" => {
                let upstream = arguments.get("upstream").and_then(Value::as_str).ok_or_else(|| {
                    RouterError::validation("'upstream' is required")
                })?;
                let content = self.unload_upstream(upstream).await?;
                Ok(ToolCallResult { content, is_error: false })
            }
            _ => {
                let tool = self
                    .discovery
                    .find_by_namespaced_name(name)
                    .await
                    .ok_or_else(|| RouterError::tool_not_found(format!("Tool '{name}' not found")))?;
                validate_tool_parameters(&arguments, &tool.input_schema)?;

                let upstream_id = name.split('.').next().unwrap_or(name);
                let result = self.proxy.call_tool(name, arguments, None).await;
                match &result {
                    Ok(_) => info!(tool_name = %name, upstream_id, status = "success", "tool call resolved"),
                    Err(err) => {
                        info!(tool_name = %name, upstream_id, status = "error", error = %err, "tool call resolved")
                    }
                }
                result
            }
        }
    }

    /// The `load_upstream` meta-tool: at least one of `upstream`/`alias`
    /// is required; `alias` is preferred when both are present.
    pub async fn load_upstream(&self, upstream: Option<&str>, alias: Option<&str>) -> Result<Vec<ContentItem>> {
        let name = alias.or(upstream).ok_or_else(|| {
            RouterError::validation("Either 'upstream' or 'alias' must be provided")
        })?;

        match self.discovery.load_upstream(name).await {
            Ok(outcome) => {
                let text = format!(
                    "Successfully loaded upstream '{}' with {} tools.",
                    outcome.upstream, outcome.tool_count
                );
                Ok(vec![ContentItem::Text { text }])
            }
            Err(err) => {
                let text = format!("Failed to load upstream '{name}': {err}");
                Ok(vec![ContentItem::Text { text }])
            }
        }
    }

    /// The `unload_upstream` meta-tool.
    pub async fn unload_upstream(&self, upstream: &str) -> Result<Vec<ContentItem>> {
        match self.discovery.unload_upstream(upstream).await {
            Ok(()) => Ok(vec![ContentItem::Text {
                text: format!("Successfully unloaded upstream '{upstream}'."),
            }]),
            Err(err) => Ok(vec![ContentItem::Text {
                text: format!("Failed to unload upstream '{upstream}': {err}"),
            }]),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}
