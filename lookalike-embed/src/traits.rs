use async_trait::async_trait;
use lookalike_common::{LookalikeError, Result};

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed every text; the output has the same length and order as the input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(v), true) => Ok(v),
            _ => Err(LookalikeError::Embedding(
                "expected exactly one embedding for a single input".into(),
            )),
        }
    }

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
