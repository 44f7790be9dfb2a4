//! Query sanitization before embedding.

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_ .,!?-]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Replace any character outside `[A-Za-z0-9_ .,!?-]` with a space, collapse
/// whitespace runs, and trim.
pub fn sanitize_query(query: &str) -> String {
    let replaced = DISALLOWED_CHAR.replace_all(query, " ");
    let collapsed = WHITESPACE_RUN.replace_all(&replaced, " ");
    collapsed.trim().to_string()
}

/// Combine a sanitized query with sanitized context strings, each appended
/// after a single space.
pub fn combine_query_and_context(query: &str, context: Option<&[String]>) -> String {
    let mut combined = sanitize_query(query);
    if let Some(context) = context {
        for item in context {
            let sanitized = sanitize_query(item);
            if !sanitized.is_empty() {
                combined.push(' ');
                combined.push_str(&sanitized);
            }
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(sanitize_query("hello<script>world"), "hello script world");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(sanitize_query("a   b\t\tc"), "a b c");
    }

    #[test]
    fn trims_leading_and_trailing_whitespace() {
        assert_eq!(sanitize_query("  hi  "), "hi");
    }

    #[test]
    fn keeps_allowed_punctuation() {
        assert_eq!(sanitize_query("ready, set-go!"), "ready, set-go!");
    }

    #[test]
    fn combine_appends_sanitized_context_after_query() {
        let combined = combine_query_and_context("find <files>", Some(&["in repo!".to_string()]));
        assert_eq!(combined, "find files in repo!");
    }

    #[test]
    fn combine_without_context_returns_sanitized_query_only() {
        assert_eq!(combine_query_and_context("hello", None), "hello");
    }
}
