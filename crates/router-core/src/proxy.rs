//! Tool-Call Proxy: routes a namespaced tool call to the upstream that
//! owns it and returns the MCP result verbatim.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::discovery::DiscoveryManager;
use crate::error::Result;
use crate::namespace::{match_upstream_by_prefix, parse_tool_namespace};
use crate::types::{RouterConfig, ToolCallResult};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Stateless router from namespaced tool name to upstream call. Holds no
/// connections itself; the Discovery Manager remains the single owner of
/// live Upstream Connections.
pub struct ToolCallProxy {
    config: Arc<RouterConfig>,
    discovery: Arc<DiscoveryManager>,
}

impl ToolCallProxy {
    pub fn new(config: Arc<RouterConfig>, discovery: Arc<DiscoveryManager>) -> Self {
        ToolCallProxy { config, discovery }
    }

    /// Parse namespace, resolve the owning upstream, forward
    /// with a timeout, and return the result unmodified.
    pub async fn call_tool(
        &self,
        namespaced_name: &str,
        arguments: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<ToolCallResult> {
        let (prefix, original_name) = parse_tool_namespace(namespaced_name)?;
        let canonical_id = match_upstream_by_prefix(&prefix, self.config.mcp_servers.iter())?;
        let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS));

        info!(
            upstream_id = %canonical_id,
            tool = %original_name,
            "forwarding tool call"
        );

        let result = self
            .discovery
            .call_tool(&canonical_id, &original_name, arguments, timeout)
            .await;

        match &result {
            Ok(_) => info!(upstream_id = %canonical_id, tool = %original_name, "tool call succeeded"),
            Err(err) => {
                tracing::warn!(upstream_id = %canonical_id, tool = %original_name, error = %err, "tool call failed")
            }
        }

        result
    }
}
