use crate::bucket;
use lookalike_config::SimilarityConfig;
use lookalike_dom::NormalizedTree;

/// Depth-weighted hashed bag of `"{tag}_{attr}_{value}"` tokens.
#[derive(Debug, Clone)]
pub struct BowExtractor {
    pub dim: usize,
    pub depth_decay: f32,
    pub warmup_depth: usize,
}

impl BowExtractor {
    pub fn from_config(cfg: &SimilarityConfig) -> Self {
        Self {
            dim: cfg.feature_dim_bow,
            depth_decay: cfg.depth_decay,
            warmup_depth: cfg.warmup_depth,
        }
    }

    /// Weight of a token found at `depth`; styled elements count double, capped at 1.
    pub fn weight(&self, depth: usize, css_mark: bool) -> f32 {
        let exponent = depth.saturating_sub(self.warmup_depth);
        let weight = self.depth_decay.powi(exponent.min(i32::MAX as usize) as i32);
        if css_mark {
            (weight * 2.0).min(1.0)
        } else {
            weight
        }
    }

    /// Empty when `dim` is zero.
    pub fn extract(&self, tree: &mut NormalizedTree) -> Vec<f32> {
        if self.dim == 0 {
            return Vec::new();
        }
        let mut features = vec![0.0f32; self.dim];
        for id in tree.preorder_list() {
            let node = tree.node(id);
            let weight = self.weight(node.depth, node.css_mark);
            for (name, value) in &node.attributes {
                let token = format!("{}_{}_{}", node.tag_name, name, value);
                features[bucket(&token, self.dim)] += weight;
            }
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookalike_dom::{GenericDom, GenericElement, TreeBuilder};

    fn extractor() -> BowExtractor {
        BowExtractor {
            dim: 64,
            depth_decay: 0.5,
            warmup_depth: 1,
        }
    }

    #[test]
    fn weights_decay_after_warmup_and_boost_styled_nodes() {
        let e = extractor();
        assert_eq!(e.weight(0, false), 1.0);
        assert_eq!(e.weight(1, false), 1.0);
        assert_eq!(e.weight(3, false), 0.25);
        assert_eq!(e.weight(3, true), 0.5);
        assert_eq!(e.weight(1, true), 1.0);
    }

    #[test]
    fn vector_has_configured_length_and_attribute_mass() {
        let dom = GenericDom::new(
            GenericElement::new("html").child(
                GenericElement::new("body")
                    .child(GenericElement::new("div").attr("class", "card").attr("id", "main")),
            ),
        );
        let mut tree = TreeBuilder::new().build(&dom);
        let v = extractor().extract(&mut tree);
        assert_eq!(v.len(), 64);
        // div sits at depth 3: two tokens of weight 0.25 each.
        let total: f32 = v.iter().sum();
        assert!((total - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_dimension_yields_an_empty_vector() {
        let dom = GenericDom::new(GenericElement::new("div").attr("id", "x"));
        let mut tree = TreeBuilder::new().build(&dom);
        let e = BowExtractor { dim: 0, ..extractor() };
        assert!(e.extract(&mut tree).is_empty());
    }

    #[test]
    fn nodes_without_attributes_contribute_nothing() {
        let dom = GenericDom::new(GenericElement::new("html").child(GenericElement::new("body")));
        let mut tree = TreeBuilder::new().build(&dom);
        assert!(extractor().extract(&mut tree).iter().all(|&x| x == 0.0));
    }
}
