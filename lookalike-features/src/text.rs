use lookalike_common::Result;
use lookalike_config::SimilarityConfig;
use lookalike_dom::NormalizedTree;
use lookalike_embed::EmbeddingClient;
use std::sync::Arc;

/// Embeds the whole rendered tree as a single text.
#[derive(Clone)]
pub struct TextExtractor {
    embedder: Arc<dyn EmbeddingClient>,
    ignore_attributes: Vec<String>,
    max_depth: usize,
}

impl TextExtractor {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, cfg: &SimilarityConfig) -> Self {
        Self {
            embedder,
            ignore_attributes: cfg.embed_ignore_tags.clone(),
            max_depth: cfg.max_depth,
        }
    }

    pub fn render(&self, tree: &NormalizedTree) -> String {
        tree.render_markup(tree.root(), &self.ignore_attributes, self.max_depth)
    }

    pub async fn extract(&self, tree: &NormalizedTree) -> Result<Vec<f32>> {
        let text = self.render(tree);
        tracing::debug!(
            chars = text.len(),
            model = self.embedder.model_name(),
            "features.text.embed"
        );
        self.embedder.embed(&text).await
    }
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor")
            .field("model", &self.embedder.model_name())
            .field("ignore_attributes", &self.ignore_attributes)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
