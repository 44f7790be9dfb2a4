//! Alias resolution: maps operator-supplied upstream aliases to their
//! canonical ids.

use std::collections::BTreeMap;

use crate::error::{RouterError, Result};
use crate::types::UpstreamConfig;

/// Build a `lowercased alias -> canonical id` map from configuration.
/// Duplicate aliases across upstreams: last-registered (by ascending
/// canonical-id iteration order) wins.
pub fn build_alias_map(servers: &BTreeMap<String, UpstreamConfig>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (canonical_id, cfg) in servers {
        for alias in &cfg.aliases {
            map.insert(alias.to_lowercase(), canonical_id.clone());
        }
    }
    map
}

/// Resolve a user-provided name to its canonical upstream id:
/// 1. Exact (case-sensitive) match against a canonical id wins outright.
/// 2. Otherwise, case-insensitive lookup against the alias map.
/// 3. Otherwise, a descriptive error listing available aliases/ids.
pub fn resolve_upstream_name(
    name: &str,
    servers: &BTreeMap<String, UpstreamConfig>,
    alias_map: &BTreeMap<String, String>,
) -> Result<String> {
    if servers.contains_key(name) {
        return Ok(name.to_string());
    }
    if let Some(canonical) = alias_map.get(&name.to_lowercase()) {
        return Ok(canonical.clone());
    }

    let canonical_ids: Vec<&str> = servers.keys().map(String::as_str).collect();
    let aliases: Vec<&str> = alias_map.keys().map(String::as_str).collect();
    Err(RouterError::validation(format!(
        "unknown upstream or alias '{name}'. Available upstreams: [{}]. Available aliases: [{}]",
        canonical_ids.join(", "),
        aliases.join(", "),
    )))
}
