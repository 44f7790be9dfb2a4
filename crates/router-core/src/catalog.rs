//! Embedding Index: the authoritative, concurrently-accessed catalog of
//! live tools and their embedding vectors.

use tokio::sync::RwLock;

use crate::default_subset::select_default_tool_subset;
use crate::error::{RouterError, Result};
use crate::similarity::cosine_similarity;
use crate::types::{SearchResult, ToolMetadata, EMBEDDING_DIMENSION};

#[derive(Debug, Default)]
struct CatalogState {
    tools: Vec<ToolMetadata>,
}

/// The single source of truth for live tool records: the Discovery Manager
/// queries this rather than keeping its own copy.
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    state: RwLock<CatalogState>,
}

impl EmbeddingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_embeddings(tools: &[ToolMetadata]) -> Result<()> {
        for tool in tools {
            match &tool.embedding {
                None => {
                    return Err(RouterError::validation(format!(
                        "Tool '{}' has no embedding",
                        tool.namespaced_name
                    )))
                }
                Some(vec) if vec.len() != EMBEDDING_DIMENSION => {
                    return Err(RouterError::validation(format!(
                        "Tool '{}' has embedding of dimension {} (expected {})",
                        tool.namespaced_name,
                        vec.len(),
                        EMBEDDING_DIMENSION
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Replace the catalog atomically. Fails (leaving the catalog untouched)
    /// if any tool lacks a correctly-dimensioned embedding.
    pub async fn set(&self, tools: Vec<ToolMetadata>) -> Result<()> {
        Self::check_embeddings(&tools)?;
        let mut state = self.state.write().await;
        state.tools = tools;
        Ok(())
    }

    /// Append tools. All-or-nothing: fails if any lacks an embedding or
    /// collides with an existing `namespaced_name`.
    pub async fn add(&self, tools: Vec<ToolMetadata>) -> Result<()> {
        Self::check_embeddings(&tools)?;
        let mut state = self.state.write().await;
        for tool in &tools {
            if state.tools.iter().any(|t| t.namespaced_name == tool.namespaced_name) {
                return Err(RouterError::validation(format!(
                    "Tool '{}' already exists in the catalog",
                    tool.namespaced_name
                )));
            }
        }
        state.tools.extend(tools);
        Ok(())
    }

    /// Remove every tool whose `namespaced_name` begins with `prefix + "."`.
    /// Idempotent: removing zero tools is success, not an error.
    pub async fn remove_by_prefix(&self, prefix: &str) -> Result<usize> {
        if prefix.is_empty() {
            return Err(RouterError::validation("prefix must be non-empty"));
        }
        let needle = format!("{prefix}.");
        let mut state = self.state.write().await;
        let before = state.tools.len();
        state.tools.retain(|t| !t.namespaced_name.starts_with(&needle));
        Ok(before - state.tools.len())
    }

    /// Rank the catalog against `query_vector`, returning the top
    /// `min(k, catalog_size)` by descending cosine similarity.
    pub async fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let state = self.state.read().await;
        if state.tools.is_empty() {
            return Err(RouterError::validation("Cannot search an empty catalog"));
        }

        let mut scored = Vec::with_capacity(state.tools.len());
        for tool in &state.tools {
            let embedding = tool.embedding.as_deref().unwrap_or(&[]);
            let similarity = cosine_similarity(query_vector, embedding)?;
            scored.push(SearchResult { tool: tool.clone(), similarity });
        }

        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        scored.truncate(std::cmp::min(k, scored.len()));
        Ok(scored)
    }

    /// Diversity-balanced default subset.
    pub async fn default_subset(&self, max_n: usize) -> Vec<ToolMetadata> {
        let state = self.state.read().await;
        select_default_tool_subset(&state.tools, max_n)
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.tools.len()
    }

    pub async fn all_tools(&self) -> Vec<ToolMetadata> {
        self.state.read().await.tools.clone()
    }

    pub async fn find_by_namespaced_name(&self, name: &str) -> Option<ToolMetadata> {
        self.state
            .read()
            .await
            .tools
            .iter()
            .find(|t| t.namespaced_name == name)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsonSchema;

    fn tool_with_embedding(namespaced_name: &str, upstream_id: &str, embedding: Vec<f32>) -> ToolMetadata {
        ToolMetadata {
            namespaced_name: namespaced_name.to_string(),
            original_name: namespaced_name.split('.').last().unwrap().to_string(),
            description: format!("does {namespaced_name}"),
            input_schema: JsonSchema::default(),
            upstream_id: upstream_id.to_string(),
            category_description: None,
            embedding: Some(embedding),
        }
    }

    fn vec_d(fill: f32) -> Vec<f32> {
        vec![fill; EMBEDDING_DIMENSION]
    }

    #[tokio::test]
    async fn set_rejects_tool_missing_embedding() {
        let index = EmbeddingIndex::new();
        let mut tool = tool_with_embedding("a.one", "a", vec_d(1.0));
        tool.embedding = None;
        assert!(index.set(vec![tool]).await.is_err());
        assert_eq!(index.count().await, 0);
    }

    #[tokio::test]
    async fn add_rejects_duplicate_namespaced_name_all_or_nothing() {
        let index = EmbeddingIndex::new();
        index.add(vec![tool_with_embedding("a.one", "a", vec_d(1.0))]).await.unwrap();
        let result = index
            .add(vec![
                tool_with_embedding("a.two", "a", vec_d(0.5)),
                tool_with_embedding("a.one", "a", vec_d(0.2)),
            ])
            .await;
        assert!(result.is_err());
        assert_eq!(index.count().await, 1);
    }

    #[tokio::test]
    async fn remove_by_prefix_is_idempotent_on_no_match() {
        let index = EmbeddingIndex::new();
        index.add(vec![tool_with_embedding("a.one", "a", vec_d(1.0))]).await.unwrap();
        let removed = index.remove_by_prefix("nope").await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(index.count().await, 1);
    }

    #[tokio::test]
    async fn remove_by_prefix_removes_only_matching_tools() {
        let index = EmbeddingIndex::new();
        index
            .add(vec![
                tool_with_embedding("a.one", "a", vec_d(1.0)),
                tool_with_embedding("ab.two", "ab", vec_d(1.0)),
            ])
            .await
            .unwrap();
        let removed = index.remove_by_prefix("a").await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(index.count().await, 1);
        assert!(index.find_by_namespaced_name("ab.two").await.is_some());
    }

    #[tokio::test]
    async fn search_on_empty_catalog_is_an_error() {
        let index = EmbeddingIndex::new();
        assert!(index.search(&vec_d(1.0), 5).await.is_err());
    }

    #[tokio::test]
    async fn search_returns_min_k_catalog_size_sorted_descending() {
        let index = EmbeddingIndex::new();
        index
            .add(vec![
                tool_with_embedding("a.one", "a", vec_d(1.0)),
                tool_with_embedding("a.two", "a", vec_d(0.5)),
                tool_with_embedding("a.three", "a", vec_d(-1.0)),
            ])
            .await
            .unwrap();

        let results = index.search(&vec_d(1.0), 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].similarity >= results[1].similarity);
        assert_eq!(results[0].tool.namespaced_name, "a.one");
    }

    #[tokio::test]
    async fn default_subset_delegates_to_selection_algorithm() {
        let index = EmbeddingIndex::new();
        index
            .add(vec![
                tool_with_embedding("a.one", "a", vec_d(1.0)),
                tool_with_embedding("b.one", "b", vec_d(1.0)),
            ])
            .await
            .unwrap();
        let subset = index.default_subset(1).await;
        assert_eq!(subset.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_search_does_not_observe_partial_add() {
        use std::sync::Arc;
        let index = Arc::new(EmbeddingIndex::new());
        index.add(vec![tool_with_embedding("a.one", "a", vec_d(1.0))]).await.unwrap();

        let writer_index = index.clone();
        let writer = tokio::spawn(async move {
            let batch: Vec<_> = (0..20)
                .map(|i| tool_with_embedding(&format!("a.gen{i}"), "a", vec_d(0.1)))
                .collect();
            writer_index.add(batch).await.unwrap();
        });

        let reader_index = index.clone();
        let reader = tokio::spawn(async move {
            let count = reader_index.count().await;
            assert!(count == 1 || count == 21);
        });

        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(index.count().await, 21);
    }
}
