//! Hierarchical structural fingerprint.
//!
//! Small or short subtrees are embedded whole ("leaf units"); larger ones are
//! represented by their open tag and split further. All unit texts go to the
//! embedding service in one batch, then the per-node vectors are folded back
//! up the tree with [`NormalizedTree::aggregate_embedding`].
//!
//! Units are rendered in full; `similarity_model.max_depth` only bounds the
//! whole-tree text fingerprint.

use lookalike_common::{LookalikeError, Result};
use lookalike_config::SimilarityConfig;
use lookalike_dom::tree::EncodedNode;
use lookalike_dom::{NodeId, NormalizedTree};
use lookalike_embed::EmbeddingClient;
use std::sync::Arc;

/// One text sent to the embedding service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedUnit {
    pub node: NodeId,
    pub text: String,
    /// Whether `text` covers the node's whole subtree.
    pub is_leaf: bool,
}

#[derive(Clone)]
pub struct StructureExtractor {
    embedder: Arc<dyn EmbeddingClient>,
    ignore_attributes: Vec<String>,
    min_height: usize,
    max_height: usize,
    min_code_len: usize,
}

impl StructureExtractor {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, cfg: &SimilarityConfig) -> Self {
        Self {
            embedder,
            ignore_attributes: cfg.embed_ignore_tags.clone(),
            min_height: cfg.min_height,
            max_height: cfg.max_height,
            min_code_len: cfg.min_code_len,
        }
    }

    /// Choose the embedding units, in preorder. Runs the height pass first.
    pub fn select_subtrees(&self, tree: &mut NormalizedTree) -> Vec<EmbedUnit> {
        tree.preorder_list();
        let mut units = Vec::new();
        for &child in &tree.node(tree.root()).children {
            self.select_from(tree, child, &mut units);
        }
        units
    }

    fn select_from(&self, tree: &NormalizedTree, id: NodeId, units: &mut Vec<EmbedUnit>) {
        let height = tree.node(id).height;
        if height <= self.min_height {
            units.push(self.leaf(tree, id, None));
            return;
        }
        if height <= self.max_height {
            let code = self.render(tree, id);
            if code.chars().count() <= self.min_code_len {
                units.push(self.leaf(tree, id, Some(code)));
                return;
            }
        }
        units.push(EmbedUnit {
            node: id,
            text: tree.open_tag_text(id, &self.ignore_attributes),
            is_leaf: false,
        });
        for &child in &tree.node(id).children {
            self.select_from(tree, child, units);
        }
    }

    fn leaf(&self, tree: &NormalizedTree, id: NodeId, rendered: Option<String>) -> EmbedUnit {
        let text = rendered.unwrap_or_else(|| self.render(tree, id));
        EmbedUnit {
            node: id,
            text,
            is_leaf: true,
        }
    }

    fn render(&self, tree: &NormalizedTree, id: NodeId) -> String {
        tree.render_markup(id, &self.ignore_attributes, usize::MAX)
    }

    pub async fn extract(&self, tree: &mut NormalizedTree) -> Result<Vec<f32>> {
        let units = self.select_subtrees(tree);
        let leaves = units.iter().filter(|u| u.is_leaf).count();
        tracing::debug!(units = units.len(), leaves, "features.structure.units");

        let texts: Vec<String> = units.iter().map(|u| u.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != units.len() {
            return Err(LookalikeError::Embedding(format!(
                "expected {} embeddings, got {}",
                units.len(),
                vectors.len()
            )));
        }

        let mut lookup: Vec<EncodedNode> = vec![None; tree.node_count()];
        for (unit, vector) in units.iter().zip(vectors) {
            let Some(index) = tree.node(unit.node).sequence_index else {
                continue;
            };
            if let Some(slot) = lookup.get_mut(index) {
                *slot = Some((vector, unit.is_leaf));
            }
        }
        tree.aggregate_embedding(&lookup)
    }
}

impl std::fmt::Debug for StructureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureExtractor")
            .field("model", &self.embedder.model_name())
            .field("min_height", &self.min_height)
            .field("max_height", &self.max_height)
            .field("min_code_len", &self.min_code_len)
            .finish()
    }
}
