use crate::{BowExtractor, StructureExtractor, TextExtractor};
use lookalike_common::{FeatureMethod, LookalikeError, Result};
use lookalike_config::SimilarityConfig;
use lookalike_dom::NormalizedTree;
use lookalike_embed::EmbeddingClient;
use serde::Serialize;
use std::sync::Arc;

/// Fingerprint of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFeatures {
    pub vector: Vec<f32>,
    /// Stylesheet fingerprint, present only when CSS was kept out of the markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<Vec<f32>>,
}

/// The tree fingerprint chosen by `similarity_model.method`.
#[derive(Debug, Clone)]
pub enum FeatureExtractor {
    Bow(BowExtractor),
    PlainText(TextExtractor),
    HtmlStructure(StructureExtractor),
}

impl FeatureExtractor {
    /// Embedding-based methods need `embedder`; bag-of-words ignores it.
    pub fn from_config(
        cfg: &SimilarityConfig,
        embedder: Option<Arc<dyn EmbeddingClient>>,
    ) -> Result<Self> {
        let need = |embedder: Option<Arc<dyn EmbeddingClient>>| {
            embedder.ok_or_else(|| {
                LookalikeError::Config(format!(
                    "method {} requires an embedding client",
                    cfg.method
                ))
            })
        };
        Ok(match cfg.method {
            FeatureMethod::Bow => FeatureExtractor::Bow(BowExtractor::from_config(cfg)),
            FeatureMethod::PlainText => {
                FeatureExtractor::PlainText(TextExtractor::new(need(embedder)?, cfg))
            }
            FeatureMethod::HtmlStructure => {
                FeatureExtractor::HtmlStructure(StructureExtractor::new(need(embedder)?, cfg))
            }
        })
    }

    pub fn method(&self) -> FeatureMethod {
        match self {
            FeatureExtractor::Bow(_) => FeatureMethod::Bow,
            FeatureExtractor::PlainText(_) => FeatureMethod::PlainText,
            FeatureExtractor::HtmlStructure(_) => FeatureMethod::HtmlStructure,
        }
    }

    pub async fn extract(&self, tree: &mut NormalizedTree) -> Result<Vec<f32>> {
        match self {
            FeatureExtractor::Bow(e) => Ok(e.extract(tree)),
            FeatureExtractor::PlainText(e) => e.extract(tree).await,
            FeatureExtractor::HtmlStructure(e) => e.extract(tree).await,
        }
    }
}
