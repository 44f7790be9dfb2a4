//! Diversity-balanced default tool subset selection.

use std::collections::BTreeMap;

use crate::types::ToolMetadata;

/// Select up to `max_n` tools from `tools`, proportionally across upstreams
/// first, then round-robin, so no single upstream dominates.
///
/// Steps:
/// 1. Group by `upstream_id`.
/// 2. Sort each group ascending by `original_name`.
/// 3. `base = max(1, max_n / num_upstreams)`; take `base` from each group,
///    in sorted-upstream-id order.
/// 4. Round-robin the remainder until `max_n` is reached or groups are dry.
/// 5. Truncate to `max_n`.
pub fn select_default_tool_subset(tools: &[ToolMetadata], max_n: usize) -> Vec<ToolMetadata> {
    if tools.is_empty() || max_n == 0 {
        return Vec::new();
    }

    let mut groups: BTreeMap<&str, Vec<&ToolMetadata>> = BTreeMap::new();
    for tool in tools {
        groups.entry(tool.upstream_id.as_str()).or_default().push(tool);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.original_name.cmp(&b.original_name));
    }

    let num_upstreams = groups.len();
    let base = std::cmp::max(1, max_n / num_upstreams);

    let mut taken_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut selected: Vec<&ToolMetadata> = Vec::new();

    for (&upstream_id, group) in groups.iter() {
        let take = std::cmp::min(base, group.len());
        selected.extend(group.iter().take(take).copied());
        taken_counts.insert(upstream_id, take);
        if selected.len() >= max_n {
            break;
        }
    }

    if selected.len() < max_n {
        loop {
            let mut advanced = false;
            for (&upstream_id, group) in groups.iter() {
                if selected.len() >= max_n {
                    break;
                }
                let taken = *taken_counts.get(upstream_id).unwrap_or(&0);
                if taken < group.len() {
                    selected.push(group[taken]);
                    taken_counts.insert(upstream_id, taken + 1);
                    advanced = true;
                }
            }
            if selected.len() >= max_n || !advanced {
                break;
            }
        }
    }

    selected.truncate(max_n);
    selected.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsonSchema;

    fn tool(upstream_id: &str, original_name: &str) -> ToolMetadata {
        ToolMetadata {
            namespaced_name: format!("{upstream_id}.{original_name}"),
            original_name: original_name.to_string(),
            description: String::new(),
            input_schema: JsonSchema::default(),
            upstream_id: upstream_id.to_string(),
            category_description: None,
            embedding: None,
        }
    }

    #[test]
    fn empty_catalog_returns_empty() {
        assert!(select_default_tool_subset(&[], 20).is_empty());
    }

    #[test]
    fn respects_max_n() {
        let tools: Vec<_> = (0..50).map(|i| tool("a", &format!("tool_{i:02}"))).collect();
        let subset = select_default_tool_subset(&tools, 20);
        assert_eq!(subset.len(), 20);
    }

    #[test]
    fn balances_across_multiple_upstreams() {
        let mut tools = Vec::new();
        for i in 0..10 {
            tools.push(tool("playwright", &format!("tool_{i:02}")));
        }
        for i in 0..10 {
            tools.push(tool("jira", &format!("tool_{i:02}")));
        }
        let subset = select_default_tool_subset(&tools, 20);
        let distinct_upstreams: std::collections::HashSet<_> =
            subset.iter().map(|t| t.upstream_id.clone()).collect();
        assert_eq!(distinct_upstreams.len(), 2);
    }

    #[test]
    fn single_upstream_hogged_tools_still_truncate_to_max_n() {
        let tools: Vec<_> = (0..5).map(|i| tool("only", &format!("tool_{i}"))).collect();
        let subset = select_default_tool_subset(&tools, 3);
        assert_eq!(subset.len(), 3);
    }

    #[test]
    fn is_deterministic_across_repeated_calls() {
        let tools: Vec<_> = vec![
            tool("b", "zeta"),
            tool("a", "alpha"),
            tool("a", "beta"),
            tool("b", "yankee"),
        ];
        let first = select_default_tool_subset(&tools, 3);
        let second = select_default_tool_subset(&tools, 3);
        let names_first: Vec<_> = first.iter().map(|t| t.namespaced_name.clone()).collect();
        let names_second: Vec<_> = second.iter().map(|t| t.namespaced_name.clone()).collect();
        assert_eq!(names_first, names_second);
    }

    #[test]
    fn round_robins_once_bases_are_exhausted() {
        // 3 upstreams, max_n=4: base = max(1, 4/3) = 1, one each = 3, then
        // round-robin picks a second tool from the first group in sorted order.
        let tools = vec![
            tool("a", "a1"),
            tool("a", "a2"),
            tool("b", "b1"),
            tool("c", "c1"),
        ];
        let subset = select_default_tool_subset(&tools, 4);
        assert_eq!(subset.len(), 4);
    }
}
