//! Configuration file loading. Reads the router's JSON configuration once
//! at startup; the result is immutable for the process lifetime.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{RouterError, Result};
use crate::types::{AutoLoad, LoadingConfig, RouterConfig, Transport, UpstreamConfig};

static ALIAS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9 _-]+$").unwrap());

/// Read and parse the configuration file at `path`.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<RouterConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        RouterError::configuration(format!(
            "Configuration file not found or unreadable: {} ({e})",
            path.display()
        ))
    })?;

    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| RouterError::configuration(format!("Invalid JSON in configuration file: {e}")))?;

    parse_config(&value)
}

/// Parse an already-loaded JSON document into a `RouterConfig`.
pub fn parse_config(value: &Value) -> Result<RouterConfig> {
    let root = value
        .as_object()
        .ok_or_else(|| RouterError::configuration("Configuration root must be a JSON object"))?;

    let mcp_servers_value = root
        .get("mcpServers")
        .ok_or_else(|| RouterError::configuration("Configuration must contain 'mcpServers' key"))?;
    let mcp_servers_obj = mcp_servers_value
        .as_object()
        .ok_or_else(|| RouterError::configuration("'mcpServers' must be a JSON object"))?;
    if mcp_servers_obj.is_empty() {
        return Err(RouterError::configuration(
            "'mcpServers' must contain at least one server",
        ));
    }

    let mut mcp_servers = BTreeMap::new();
    for (upstream_id, upstream_value) in mcp_servers_obj {
        mcp_servers.insert(upstream_id.clone(), parse_upstream(upstream_id, upstream_value)?);
    }

    let loading = match root.get("loading") {
        Some(loading_value) => parse_loading(loading_value)?,
        None => LoadingConfig::default(),
    };

    Ok(RouterConfig { mcp_servers, loading })
}

fn parse_upstream(upstream_id: &str, value: &Value) -> Result<UpstreamConfig> {
    let obj = value.as_object().ok_or_else(|| {
        RouterError::configuration(format!("Configuration for '{upstream_id}' must be a JSON object"))
    })?;

    let transport_str = obj
        .get("transport")
        .and_then(Value::as_str)
        .ok_or_else(|| RouterError::configuration(format!("'transport' is required for upstream '{upstream_id}'")))?;

    let transport = match transport_str {
        "stdio" => {
            let command = obj
                .get("command")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    RouterError::configuration(format!(
                        "'command' is required for stdio transport on upstream '{upstream_id}'"
                    ))
                })?
                .to_string();
            let args = obj
                .get("args")
                .map(|v| {
                    v.as_array()
                        .ok_or_else(|| {
                            RouterError::configuration(format!("'args' for upstream '{upstream_id}' must be a list"))
                        })
                        .map(|arr| arr.iter().filter_map(|i| i.as_str().map(String::from)).collect())
                })
                .transpose()?
                .unwrap_or_default();
            Transport::Stdio { command, args }
        }
        "sse" | "http" => {
            let url = obj
                .get("url")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    RouterError::configuration(format!(
                        "'url' is required for {transport_str} transport on upstream '{upstream_id}'"
                    ))
                })?
                .to_string();
            if transport_str == "sse" {
                Transport::Sse { url }
            } else {
                Transport::Http { url }
            }
        }
        other => {
            return Err(RouterError::configuration(format!(
                "Invalid transport '{other}' for upstream '{upstream_id}'. Must be 'stdio', 'sse', or 'http'"
            )))
        }
    };

    let semantic_prefix = obj.get("semantic_prefix").and_then(Value::as_str).map(String::from);
    let category_description = obj.get("category_description").and_then(Value::as_str).map(String::from);

    let aliases = match obj.get("aliases") {
        Some(v) => {
            let arr = v.as_array().ok_or_else(|| {
                RouterError::configuration(format!("'aliases' for upstream '{upstream_id}' must be a list"))
            })?;
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                let alias = item.as_str().ok_or_else(|| {
                    RouterError::configuration(format!("aliases for upstream '{upstream_id}' must be strings"))
                })?;
                if alias.is_empty() {
                    return Err(RouterError::configuration("Alias cannot be empty".to_string()));
                }
                if !ALIAS_PATTERN.is_match(alias) {
                    return Err(RouterError::configuration(format!(
                        "Invalid alias '{alias}': aliases must contain only alphanumeric characters, spaces, hyphens, and underscores"
                    )));
                }
                out.push(alias.to_string());
            }
            out
        }
        None => Vec::new(),
    };

    Ok(UpstreamConfig { transport, semantic_prefix, category_description, aliases })
}

fn parse_loading(value: &Value) -> Result<LoadingConfig> {
    let obj = value
        .as_object()
        .ok_or_else(|| RouterError::configuration("'loading' must be a JSON object"))?;

    let auto_load = match obj.get("auto_load") {
        Some(v) => {
            let arr = v
                .as_array()
                .ok_or_else(|| RouterError::configuration("'auto_load' must be a list"))?;
            let names: Vec<String> = arr
                .iter()
                .map(|i| {
                    i.as_str()
                        .map(String::from)
                        .ok_or_else(|| RouterError::configuration("'auto_load' entries must be strings"))
                })
                .collect::<Result<_>>()?;
            if names.len() == 1 && names[0] == "all" {
                AutoLoad::All
            } else if names.is_empty() {
                AutoLoad::None
            } else {
                AutoLoad::Named(names)
            }
        }
        None => AutoLoad::All,
    };

    let lazy_load = obj.get("lazy_load").and_then(Value::as_bool).unwrap_or(true);
    let cache_embeddings = obj.get("cache_embeddings").and_then(Value::as_bool).unwrap_or(true);

    let connection_timeout_seconds = positive_int(obj, "connection_timeout", 30)?;
    let max_concurrent_upstreams = positive_int(obj, "max_concurrent_upstreams", 10)? as usize;
    let rate_limit = positive_int(obj, "rate_limit", 5)? as u32;

    Ok(LoadingConfig {
        auto_load,
        lazy_load,
        cache_embeddings,
        connection_timeout_seconds,
        max_concurrent_upstreams,
        rate_limit,
    })
}

fn positive_int(obj: &serde_json::Map<String, Value>, key: &str, default: u64) -> Result<u64> {
    match obj.get(key) {
        None => Ok(default),
        Some(v) => {
            let n = v
                .as_u64()
                .or_else(|| v.as_i64().filter(|n| *n > 0).map(|n| n as u64))
                .ok_or_else(|| RouterError::configuration(format!("'{key}' must be a positive integer")))?;
            if n == 0 {
                return Err(RouterError::configuration(format!("'{key}' must be positive")));
            }
            Ok(n)
        }
    }
}
