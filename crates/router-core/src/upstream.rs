//! Upstream Connection: one MCP session over stdio per configured upstream,
//! in the `rmcp`-based client style of `crucible-acp/src/lib.rs` and
//! `crucible-cli/src/commands/mcp.rs`.

use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, Tool as RmcpTool};
use rmcp::service::RunningService;
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use tokio::process::Command;

use crate::error::{RouterError, Result};
use crate::namespace::generate_tool_namespace;
use crate::types::{ContentItem, JsonSchema, ToolCallResult, ToolMetadata, Transport, UpstreamConfig};

/// Lifecycle state of one Upstream Connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    Closed,
    Failed,
}

/// Behavioral contract an Upstream Connection exposes to the Discovery
/// Manager and Tool-Call Proxy. Split out as a trait so discovery/proxy
/// tests can substitute a `mockall`-generated fake instead of spawning a
/// real child process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamHandle: Send + Sync {
    fn state(&self) -> ConnectionState;
    async fn connect(&mut self) -> Result<()>;
    async fn fetch_tools(&mut self) -> Result<Vec<ToolMetadata>>;
    async fn call_tool(&self, original_name: &str, arguments: serde_json::Value) -> Result<ToolCallResult>;
    async fn disconnect(&mut self) -> Result<()>;
}

/// `stdio`-transport Upstream Connection. `sse`/`http` are accepted at
/// configuration time but fail cleanly on `connect()`.
pub struct UpstreamConnection {
    upstream_id: String,
    config: UpstreamConfig,
    state: ConnectionState,
    session: Option<RunningService<RoleClient, ()>>,
}

impl UpstreamConnection {
    pub fn new(upstream_id: impl Into<String>, config: UpstreamConfig) -> Self {
        UpstreamConnection {
            upstream_id: upstream_id.into(),
            config,
            state: ConnectionState::Disconnected,
            session: None,
        }
    }

    pub fn upstream_id(&self) -> &str {
        &self.upstream_id
    }

    fn tool_from_rmcp(&self, tool: RmcpTool) -> ToolMetadata {
        let namespaced_name = generate_tool_namespace(&self.upstream_id, &tool.name, &self.config);
        let schema_value = serde_json::Value::Object((*tool.input_schema).clone());
        ToolMetadata {
            namespaced_name,
            original_name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
            input_schema: JsonSchema::from_value(&schema_value),
            upstream_id: self.upstream_id.clone(),
            category_description: self.config.category_description.clone(),
            embedding: None,
        }
    }
}

#[async_trait]
impl UpstreamHandle for UpstreamConnection {
    fn state(&self) -> ConnectionState {
        self.state
    }

    async fn connect(&mut self) -> Result<()> {
        self.state = ConnectionState::Connecting;

        let (command, args) = match &self.config.transport {
            Transport::Stdio { command, args } => (command.clone(), args.clone()),
            Transport::Sse { .. } | Transport::Http { .. } => {
                self.state = ConnectionState::Failed;
                return Err(RouterError::upstream(
                    "transport not implemented: only stdio upstreams can be connected",
                ));
            }
        };

        let mut cmd = Command::new(&command);
        cmd.args(&args);

        let transport = TokioChildProcess::new(cmd).map_err(|e| {
            self.state = ConnectionState::Failed;
            RouterError::upstream(format!("Connection failed: {e}"))
        })?;

        let session = ().serve(transport).await.map_err(|e| {
            RouterError::upstream(format!("Connection failed: {e}"))
        });

        match session {
            Ok(session) => {
                self.session = Some(session);
                self.state = ConnectionState::Ready;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Failed;
                Err(err)
            }
        }
    }

    async fn fetch_tools(&mut self) -> Result<Vec<ToolMetadata>> {
        if self.state != ConnectionState::Ready {
            return Err(RouterError::upstream("upstream not connected"));
        }
        let session = self.session.as_ref().expect("Ready implies a session");

        let result = session.peer().list_all_tools().await.map_err(|e| {
            self.state = ConnectionState::Closed;
            RouterError::upstream_with_data(
                format!("Failed to fetch tools from '{}': {e}", self.upstream_id),
                serde_json::json!({"upstream_id": self.upstream_id}),
            )
        })?;

        Ok(result.into_iter().map(|t| self.tool_from_rmcp(t)).collect())
    }

    async fn call_tool(&self, original_name: &str, arguments: serde_json::Value) -> Result<ToolCallResult> {
        if self.state != ConnectionState::Ready {
            return Err(RouterError::upstream("upstream not connected"));
        }
        let session = self.session.as_ref().expect("Ready implies a session");

        let arguments = arguments.as_object().cloned();
        let request = CallToolRequestParam { name: original_name.to_string().into(), arguments };

        let result = session.peer().call_tool(request).await.map_err(|e| {
            RouterError::upstream_with_data(
                format!("Upstream '{}' failed on tool '{original_name}': {e}", self.upstream_id),
                serde_json::json!({"upstream_id": self.upstream_id, "tool": original_name}),
            )
        })?;

        let content = result
            .content
            .into_iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .filter_map(|v| serde_json::from_value::<ContentItem>(v).ok())
            .collect();

        Ok(ToolCallResult { content, is_error: result.is_error.unwrap_or(false) })
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            let _ = session.cancel().await;
        }
        self.state = ConnectionState::Closed;
        Ok(())
    }
}

/// Run `call_tool` bounded by a timeout. The timeout error names the tool,
/// the owning upstream, and the elapsed budget (§4.4 step 4).
pub async fn call_tool_with_timeout(
    handle: &dyn UpstreamHandle,
    upstream_id: &str,
    original_name: &str,
    arguments: serde_json::Value,
    timeout: Duration,
) -> Result<ToolCallResult> {
    match tokio::time::timeout(timeout, handle.call_tool(original_name, arguments)).await {
        Ok(result) => result,
        Err(_) => Err(RouterError::upstream(format!(
            "Tool '{original_name}' on upstream '{upstream_id}' timed out after {:.1}s",
            timeout.as_secs_f64()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stdio_config() -> UpstreamConfig {
        UpstreamConfig {
            transport: Transport::Stdio { command: "does-not-exist".into(), args: vec![] },
            semantic_prefix: None,
            category_description: None,
            aliases: vec![],
        }
    }

    #[test]
    fn new_connection_starts_disconnected() {
        let conn = UpstreamConnection::new("playwright", stdio_config());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_on_reserved_transport_fails_cleanly() {
        let config = UpstreamConfig {
            transport: Transport::Sse { url: "http://example.invalid".into() },
            semantic_prefix: None,
            category_description: None,
            aliases: vec![],
        };
        let mut conn = UpstreamConnection::new("remote", config);
        let err = conn.connect().await.unwrap_err();
        assert_eq!(conn.state(), ConnectionState::Failed);
        assert!(err.to_string().contains("not implemented"));
    }

    #[tokio::test]
    async fn fetch_tools_before_ready_is_an_error() {
        let mut conn = UpstreamConnection::new("playwright", stdio_config());
        let err = conn.fetch_tools().await.unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[tokio::test]
    async fn call_tool_with_timeout_surfaces_timeout_error() {
        let mut mock = MockUpstreamHandle::new();
        mock.expect_call_tool().returning(|_, _| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                unreachable!()
            })
        });

        let err = call_tool_with_timeout(
            &mock,
            "playwright",
            "slow_tool",
            serde_json::json!({}),
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("playwright"));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let mut conn = UpstreamConnection::new("playwright", stdio_config());
        assert!(conn.disconnect().await.is_ok());
        assert!(conn.disconnect().await.is_ok());
        assert_eq!(conn.state(), ConnectionState::Closed);
    }
}
