//! Discovery Manager: upstream lifecycle orchestration, alias resolution,
//! and the bridge from connections into the Embedding Index.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use crate::alias::{build_alias_map, resolve_upstream_name};
use crate::catalog::EmbeddingIndex;
use crate::embedding_model::EmbeddingModel;
use crate::error::{RouterError, Result};
use crate::types::{AutoLoad, RouterConfig, ToolCallResult, ToolMetadata};
use crate::upstream::{call_tool_with_timeout, ConnectionState, UpstreamConnection, UpstreamHandle};

/// Outcome of a successful `load_upstream` call.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub upstream: String,
    pub tool_count: usize,
}

/// One failure within a `load_multiple` batch.
#[derive(Debug, Clone)]
pub struct FailedLoad {
    pub name: String,
    pub error: String,
}

/// Outcome of `load_multiple`: partitioned success/failure, no single
/// upstream's failure blocks another.
#[derive(Debug, Clone, Default)]
pub struct LoadMultipleOutcome {
    pub loaded: Vec<String>,
    pub failed: Vec<FailedLoad>,
}

type ConnectionFactory = dyn Fn(&str, crate::types::UpstreamConfig) -> Box<dyn UpstreamHandle> + Send + Sync;

/// Orchestrates upstream lifecycle and keeps the Embedding Index
/// synchronized. Holds connections and aliasing state; the Embedding Index
/// remains the single source of truth for live tool records.
pub struct DiscoveryManager {
    config: Arc<RouterConfig>,
    alias_map: std::collections::BTreeMap<String, String>,
    index: Arc<EmbeddingIndex>,
    embedding_model: Arc<dyn EmbeddingModel>,
    connections: Mutex<HashMap<String, Box<dyn UpstreamHandle>>>,
    factory: Box<ConnectionFactory>,
}

impl DiscoveryManager {
    pub fn new(config: Arc<RouterConfig>, index: Arc<EmbeddingIndex>, embedding_model: Arc<dyn EmbeddingModel>) -> Self {
        let alias_map = build_alias_map(&config.mcp_servers);
        DiscoveryManager {
            config,
            alias_map,
            index,
            embedding_model,
            connections: Mutex::new(HashMap::new()),
            factory: Box::new(|id, cfg| Box::new(UpstreamConnection::new(id, cfg))),
        }
    }

    /// Build a manager with a custom connection factory (tests substitute a
    /// `mockall`-generated `UpstreamHandle`).
    pub fn with_connection_factory(
        config: Arc<RouterConfig>,
        index: Arc<EmbeddingIndex>,
        embedding_model: Arc<dyn EmbeddingModel>,
        factory: Box<ConnectionFactory>,
    ) -> Self {
        let alias_map = build_alias_map(&config.mcp_servers);
        DiscoveryManager { config, alias_map, index, embedding_model, connections: Mutex::new(HashMap::new()), factory }
    }

    fn resolve(&self, name: &str) -> Result<String> {
        resolve_upstream_name(name, &self.config.mcp_servers, &self.alias_map)
    }

    /// Load every upstream named by `auto_load`. Failures are logged and
    /// recorded but never abort startup.
    pub async fn startup(&self) -> Vec<Result<LoadOutcome>> {
        let names: Vec<String> = match &self.config.loading.auto_load {
            AutoLoad::All => self.config.mcp_servers.keys().cloned().collect(),
            AutoLoad::None => return Vec::new(),
            AutoLoad::Named(names) => names.clone(),
        };

        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let outcome = self.load_upstream(&name).await;
            if let Err(err) = &outcome {
                warn!(upstream = %name, error = %err, "upstream failed to load during startup");
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Connect to an upstream, list its tools, embed them, and register them
    /// in the Embedding Index under a namespaced id.
    pub async fn load_upstream(&self, name: &str) -> Result<LoadOutcome> {
        let canonical_id = self.resolve(name)?;

        {
            let connections = self.connections.lock().await;
            if let Some(existing) = connections.get(&canonical_id) {
                if existing.state() == ConnectionState::Ready {
                    let tool_count = self
                        .index
                        .all_tools()
                        .await
                        .iter()
                        .filter(|t| t.upstream_id == canonical_id)
                        .count();
                    return Ok(LoadOutcome { upstream: canonical_id, tool_count });
                }
            }
        }

        let upstream_cfg = self
            .config
            .mcp_servers
            .get(&canonical_id)
            .ok_or_else(|| RouterError::validation(format!("'{canonical_id}' is not configured")))?
            .clone();

        let mut handle = (self.factory)(&canonical_id, upstream_cfg);
        let timeout = Duration::from_secs(self.config.loading.connection_timeout_seconds);

        match tokio::time::timeout(timeout, handle.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(RouterError::upstream(format!(
                    "Connection timeout after {}s",
                    self.config.loading.connection_timeout_seconds
                )))
            }
        }

        let mut tools = match handle.fetch_tools().await {
            Ok(tools) => tools,
            Err(err) => {
                let _ = handle.disconnect().await;
                return Err(err);
            }
        };

        if let Err(err) = self.embedding_model.embed_tools(&mut tools).await {
            let _ = handle.disconnect().await;
            return Err(err);
        }

        let tool_count = tools.len();
        if let Err(err) = self.index.add(tools).await {
            let _ = handle.disconnect().await;
            return Err(err);
        }

        info!(upstream_id = %canonical_id, tool_count, "upstream tool discovery succeeded");

        self.connections.lock().await.insert(canonical_id.clone(), handle);
        Ok(LoadOutcome { upstream: canonical_id, tool_count })
    }

    /// Resolve all names first, then load the
    /// resolved ones concurrently bounded by `max_concurrent_upstreams`.
    pub async fn load_multiple(&self, names: &[String]) -> LoadMultipleOutcome {
        let mut outcome = LoadMultipleOutcome::default();
        let mut resolved = Vec::new();
        for name in names {
            match self.resolve(name) {
                Ok(canonical_id) => resolved.push((name.clone(), canonical_id)),
                Err(err) => outcome.failed.push(FailedLoad { name: name.clone(), error: err.to_string() }),
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.loading.max_concurrent_upstreams));
        let futures = resolved.into_iter().map(|(original_name, canonical_id)| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore is never closed");
                let result = self.load_upstream(&canonical_id).await;
                (original_name, result)
            }
        });

        for (original_name, result) in futures::future::join_all(futures).await {
            match result {
                Ok(loaded) => outcome.loaded.push(loaded.upstream),
                Err(err) => outcome.failed.push(FailedLoad { name: original_name, error: err.to_string() }),
            }
        }

        outcome
    }

    /// Disconnect an upstream and remove its tools from the Embedding Index.
    pub async fn unload_upstream(&self, name: &str) -> Result<()> {
        let canonical_id = self.resolve(name)?;

        let has_connection = self.connections.lock().await.contains_key(&canonical_id);
        if !has_connection {
            return Ok(()); // idempotent: already unloaded
        }

        let prefix = self
            .config
            .mcp_servers
            .get(&canonical_id)
            .map(|cfg| cfg.namespace_prefix(&canonical_id).to_string())
            .unwrap_or_else(|| canonical_id.clone());

        self.index.remove_by_prefix(&prefix).await?;

        let mut connections = self.connections.lock().await;
        if let Some(mut handle) = connections.remove(&canonical_id) {
            if let Err(err) = handle.disconnect().await {
                warn!(upstream_id = %canonical_id, error = %err, "disconnect failed during unload, ignoring");
            }
        }

        Ok(())
    }

    pub async fn is_loaded(&self, name: &str) -> bool {
        match self.resolve(name) {
            Ok(canonical_id) => self.connections.lock().await.contains_key(&canonical_id),
            Err(_) => false,
        }
    }

    pub async fn loaded_upstreams(&self) -> Vec<String> {
        self.connections.lock().await.keys().cloned().collect()
    }

    pub fn available_upstreams(&self) -> Vec<String> {
        self.config.mcp_servers.keys().cloned().collect()
    }

    pub async fn all_tools(&self) -> Vec<ToolMetadata> {
        self.index.all_tools().await
    }

    pub async fn find_by_namespaced_name(&self, name: &str) -> Option<ToolMetadata> {
        self.index.find_by_namespaced_name(name).await
    }

    pub async fn default_tool_subset(&self, max_n: usize) -> Vec<ToolMetadata> {
        self.index.default_subset(max_n).await
    }

    /// Forward a call to the connection owning `canonical_id` (parse the
    /// 3-4). The caller (Tool-Call Proxy) has already resolved the
    /// namespace prefix to this canonical id.
    pub async fn call_tool(
        &self,
        canonical_id: &str,
        original_name: &str,
        arguments: serde_json::Value,
        timeout: Duration,
    ) -> Result<ToolCallResult> {
        let connections = self.connections.lock().await;
        let handle = connections.get(canonical_id).ok_or_else(|| {
            RouterError::upstream(format!("Upstream '{canonical_id}' not connected for tool '{original_name}'"))
        })?;
        if handle.state() != ConnectionState::Ready {
            return Err(RouterError::upstream(format!(
                "Upstream '{canonical_id}' is not connected for tool '{original_name}'"
            )));
        }
        call_tool_with_timeout(handle.as_ref(), canonical_id, original_name, arguments, timeout).await
    }
}
