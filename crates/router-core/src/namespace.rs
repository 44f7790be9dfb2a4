//! Namespaced tool name generation and parsing: a namespaced name is
//! `"<prefix>.<original_name>"`, split on the *first* `.`.

use crate::error::{RouterError, Result};
use crate::types::UpstreamConfig;

/// Build the namespaced name for a tool discovered from `canonical_id`.
pub fn generate_tool_namespace(
    canonical_id: &str,
    original_name: &str,
    cfg: &UpstreamConfig,
) -> String {
    format!("{}.{}", cfg.namespace_prefix(canonical_id), original_name)
}

/// Split a namespaced name into `(prefix, original_name)`.
///
/// At least one `.`, a non-empty
/// (after trim) prefix, and a remainder that is non-empty and not composed
/// solely of `.` or whitespace.
pub fn parse_tool_namespace(namespaced_name: &str) -> Result<(String, String)> {
    let Some(dot_index) = namespaced_name.find('.') else {
        return Err(RouterError::validation(format!(
            "Invalid tool name '{namespaced_name}': expected '<prefix>.<tool_name>'"
        )));
    };

    let prefix = &namespaced_name[..dot_index];
    let remainder = &namespaced_name[dot_index + 1..];

    if prefix.trim().is_empty() {
        return Err(RouterError::validation(format!(
            "Invalid tool name '{namespaced_name}': prefix is empty"
        )));
    }
    if remainder.is_empty() || remainder.chars().all(|c| c == '.' || c.is_whitespace()) {
        return Err(RouterError::validation(format!(
            "Invalid tool name '{namespaced_name}': tool name is empty"
        )));
    }

    Ok((prefix.to_string(), remainder.to_string()))
}

/// Resolve a namespace prefix to the canonical upstream id that owns it
/// First as a canonical id, then against each upstream's
/// `semantic_prefix`.
pub fn match_upstream_by_prefix<'a>(
    prefix: &str,
    servers: impl Iterator<Item = (&'a String, &'a UpstreamConfig)>,
) -> Result<String> {
    let mut by_semantic_prefix: Option<String> = None;
    for (canonical_id, cfg) in servers {
        if canonical_id == prefix {
            return Ok(canonical_id.clone());
        }
        if by_semantic_prefix.is_none() {
            if let Some(sp) = &cfg.semantic_prefix {
                if sp == prefix {
                    by_semantic_prefix = Some(canonical_id.clone());
                }
            }
        }
    }
    by_semantic_prefix.ok_or_else(|| {
        RouterError::validation(format!("No upstream found for prefix '{prefix}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transport;
    use std::collections::BTreeMap;

    fn stdio_cfg(semantic_prefix: Option<&str>) -> UpstreamConfig {
        UpstreamConfig {
            transport: Transport::Stdio { command: "x".into(), args: vec![] },
            semantic_prefix: semantic_prefix.map(String::from),
            category_description: None,
            aliases: vec![],
        }
    }

    #[test]
    fn generate_then_parse_round_trips() {
        let cfg = stdio_cfg(None);
        let ns = generate_tool_namespace("playwright", "browser_snapshot", &cfg);
        assert_eq!(ns, "playwright.browser_snapshot");
        let (prefix, name) = parse_tool_namespace(&ns).unwrap();
        assert_eq!(prefix, "playwright");
        assert_eq!(name, "browser_snapshot");
    }

    #[test]
    fn generate_uses_semantic_prefix_when_set() {
        let cfg = stdio_cfg(Some("web"));
        let ns = generate_tool_namespace("playwright", "navigate", &cfg);
        assert_eq!(ns, "web.navigate");
    }

    #[test]
    fn parse_rejects_missing_dot() {
        assert!(parse_tool_namespace("no_dot_here").is_err());
    }

    #[test]
    fn parse_rejects_empty_prefix() {
        assert!(parse_tool_namespace(".tool").is_err());
    }

    #[test]
    fn parse_rejects_dots_only_remainder() {
        assert!(parse_tool_namespace("prefix...").is_err());
    }

    #[test]
    fn parse_allows_dots_within_original_name() {
        // Only the first dot splits; the remainder may itself contain dots.
        let (prefix, name) = parse_tool_namespace("fs.read.file").unwrap();
        assert_eq!(prefix, "fs");
        assert_eq!(name, "read.file");
    }

    #[test]
    fn match_prefers_canonical_id_over_semantic_prefix_collision() {
        let mut servers = BTreeMap::new();
        servers.insert("upstream1".to_string(), stdio_cfg(Some("upstream2")));
        servers.insert("upstream2".to_string(), stdio_cfg(None));

        let resolved = match_upstream_by_prefix("upstream2", servers.iter()).unwrap();
        assert_eq!(resolved, "upstream2");
    }

    #[test]
    fn match_falls_back_to_semantic_prefix() {
        let mut servers = BTreeMap::new();
        servers.insert("playwright".to_string(), stdio_cfg(Some("web")));

        let resolved = match_upstream_by_prefix("web", servers.iter()).unwrap();
        assert_eq!(resolved, "playwright");
    }

    #[test]
    fn match_fails_with_descriptive_message() {
        let servers: BTreeMap<String, UpstreamConfig> = BTreeMap::new();
        let err = match_upstream_by_prefix("nope", servers.iter()).unwrap_err();
        assert!(err.to_string().contains("No upstream found"));
    }
}
