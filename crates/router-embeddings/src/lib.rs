//! Local ONNX-backed embedding model: implements `router_core`'s
//! `EmbeddingModel` trait over `fastembed`'s `all-MiniLM-L6-v2`
//! (`TextEmbedding::try_new`/`InitOptions`/`.embed(docs, None)`).

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel as FastembedModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;

use router_core::embedding_model::{compose_embedding_text, EmbeddingModel};
use router_core::types::{ToolMetadata, EMBEDDING_DIMENSION};
use router_core::{Result, RouterError};

/// `fastembed`-backed implementation of `EmbeddingModel`. The underlying
/// `TextEmbedding` is not `Send`-cheap to clone, so it's loaded once behind
/// a `Mutex` and `initialize()` is idempotent: repeated calls are cheap
/// once the model is loaded.
pub struct FastembedModelHandle {
    model: Mutex<Option<TextEmbedding>>,
}

impl FastembedModelHandle {
    pub fn new() -> Self {
        FastembedModelHandle { model: Mutex::new(None) }
    }

    async fn ensure_initialized(&self) -> Result<()> {
        let mut guard = self.model.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let loaded = tokio::task::spawn_blocking(|| {
            TextEmbedding::try_new(
                InitOptions::new(FastembedModel::AllMiniLML6V2).with_show_download_progress(true),
            )
        })
        .await
        .map_err(|e| RouterError::embedding(format!("Embedding model init task panicked: {e}")))?
        .map_err(|e| RouterError::embedding(format!("Failed to initialize embedding model: {e}")))?;
        *guard = Some(loaded);
        Ok(())
    }

    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.ensure_initialized().await?;
        let guard = self.model.lock().await;
        let model = guard.as_ref().expect("ensure_initialized populates the model");

        model
            .embed(texts, None)
            .map_err(|e| RouterError::embedding(format!("Embedding failed: {e}")))
    }
}

impl Default for FastembedModelHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingModel for FastembedModelHandle {
    async fn initialize(&self) -> Result<()> {
        self.ensure_initialized().await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RouterError::validation("Cannot embed empty text"));
        }
        let mut vectors = self.embed_texts(vec![text.to_string()]).await?;
        let vector = vectors.pop().expect("embed_texts returns one vector per input");
        validate_dimension(&vector)?;
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(RouterError::validation("Cannot embed empty text"));
        }
        let vectors = self.embed_texts(texts.to_vec()).await?;
        for vector in &vectors {
            validate_dimension(vector)?;
        }
        Ok(vectors)
    }

    async fn embed_tools(&self, tools: &mut [ToolMetadata]) -> Result<()> {
        let texts: Vec<String> = tools.iter().map(compose_embedding_text).collect();
        let vectors = self.embed_batch(&texts).await?;
        for (tool, vector) in tools.iter_mut().zip(vectors) {
            tool.embedding = Some(vector);
        }
        Ok(())
    }
}

fn validate_dimension(vector: &[f32]) -> Result<()> {
    if vector.len() != EMBEDDING_DIMENSION {
        return Err(RouterError::embedding(format!(
            "Embedding model produced dimension {} (expected {EMBEDDING_DIMENSION})",
            vector.len()
        )));
    }
    Ok(())
}

/// Convenience constructor for the default handle, shared across the
/// process behind an `Arc` (the Discovery Manager and Router Facade both
/// hold a reference).
pub fn default_embedding_model() -> Arc<dyn EmbeddingModel> {
    Arc::new(FastembedModelHandle::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_dimension_rejects_wrong_length() {
        let err = validate_dimension(&[0.0; 10]).unwrap_err();
        assert!(err.to_string().contains("dimension"));
    }

    #[test]
    fn validate_dimension_accepts_expected_length() {
        assert!(validate_dimension(&vec![0.0; EMBEDDING_DIMENSION]).is_ok());
    }
}
