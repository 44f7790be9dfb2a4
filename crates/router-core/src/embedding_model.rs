//! The embedding model external collaborator: the core only depends on
//! this trait, never on a concrete model implementation. `router-embeddings`
//! provides the `fastembed`-backed implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ToolMetadata;

/// Compose the embedding text for a tool: `original_name | description
/// [| category_description] [| "Parameters: " + comma-joined property names]`,
/// emitting only the sections that have content.
pub fn compose_embedding_text(tool: &ToolMetadata) -> String {
    let mut sections = vec![tool.original_name.clone(), tool.description.clone()];
    if let Some(category) = &tool.category_description {
        if !category.trim().is_empty() {
            sections.push(category.clone());
        }
    }
    let params = tool.input_schema.parameter_names();
    if !params.is_empty() {
        sections.push(format!("Parameters: {}", params.join(", ")));
    }
    sections.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" | ")
}

/// External embedding-model collaborator contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Idempotent one-shot initialization (model load, warmup).
    async fn initialize(&self) -> Result<()>;

    /// Embed a single piece of text. Errors on empty/whitespace-only input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts in order. Errors if any element is empty.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Score every tool in place, composing the embedding text for each.
    async fn embed_tools(&self, tools: &mut [ToolMetadata]) -> Result<()>;
}
