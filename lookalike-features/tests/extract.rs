use async_trait::async_trait;
use lookalike_common::{FeatureMethod, LookalikeError, Result};
use lookalike_config::SimilarityConfig;
use lookalike_dom::{GenericDom, GenericElement, TreeBuilder};
use lookalike_embed::EmbeddingClient;
use lookalike_features::{FeatureExtractor, StructureExtractor};
use std::sync::{Arc, Mutex};

/// Embeds a text as `[chars, 1]` and records every batch it receives.
#[derive(Default)]
struct RecordingEmbedder {
    batches: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl EmbeddingClient for RecordingEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(texts.to_vec());
        Ok(texts
            .iter()
            .map(|t| vec![t.chars().count() as f32, 1.0])
            .collect())
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

fn page() -> GenericDom {
    GenericDom::new(
        GenericElement::new("html").child(
            GenericElement::new("body")
                .attr("class", "home")
                .child(GenericElement::new("p").attr("src", "a.png")),
        ),
    )
}

fn similarity(method: FeatureMethod) -> SimilarityConfig {
    SimilarityConfig {
        method,
        ..SimilarityConfig::default()
    }
}

#[tokio::test]
async fn single_small_child_is_one_leaf_unit() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let cfg = similarity(FeatureMethod::HtmlStructure);
    let extractor = StructureExtractor::new(embedder.clone(), &cfg);

    let mut tree = TreeBuilder::new().build(&GenericDom::new(GenericElement::new("html")));
    let units = extractor.select_subtrees(&mut tree);
    assert_eq!(units.len(), 1);
    assert!(units[0].is_leaf);
    assert_eq!(units[0].text, "<html>\n</html>");

    let vector = extractor.extract(&mut tree).await.unwrap();
    assert_eq!(vector, vec![14.0, 1.0]);
}

#[tokio::test]
async fn tall_subtrees_split_into_open_tags_and_leaves() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let cfg = SimilarityConfig {
        min_height: 1,
        max_height: 1,
        ..similarity(FeatureMethod::HtmlStructure)
    };
    let extractor = StructureExtractor::new(embedder.clone(), &cfg);
    let mut tree = TreeBuilder::new().build(&page());

    let vector = extractor.extract(&mut tree).await.unwrap();

    let batches = embedder.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0],
        vec![
            "<html>".to_string(),
            "<body class=home>".to_string(),
            "<p>\n</p>".to_string(),
        ]
    );
    // body = mean([17, 1], [8, 1]); html = mean([6, 1], body).
    assert_eq!(vector, vec![9.25, 1.0]);
}

#[tokio::test]
async fn short_subtree_within_max_height_is_embedded_whole() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let cfg = SimilarityConfig {
        min_height: 1,
        ..similarity(FeatureMethod::HtmlStructure)
    };
    let extractor = StructureExtractor::new(embedder, &cfg);
    let mut tree = TreeBuilder::new().build(&page());

    let units = extractor.select_subtrees(&mut tree);
    assert_eq!(units.len(), 1);
    assert!(units[0].is_leaf);
    assert_eq!(
        units[0].text,
        "<html>\n<body class=home>\n<p>\n</p>\n</body>\n</html>"
    );
}

#[tokio::test]
async fn structure_units_ignore_the_text_depth_limit() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let cfg = SimilarityConfig {
        min_height: 1,
        max_height: 1,
        max_depth: 1,
        ..similarity(FeatureMethod::HtmlStructure)
    };
    let extractor = StructureExtractor::new(embedder, &cfg);
    let mut tree = TreeBuilder::new().build(&page());

    let units = extractor.select_subtrees(&mut tree);
    let leaf = units.iter().find(|u| u.is_leaf).unwrap();
    assert_eq!(tree.node(leaf.node).depth, 3);
    assert_eq!(leaf.text, "<p>\n</p>");
}

#[tokio::test]
async fn plain_text_embeds_the_rendered_tree_once() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let client: Arc<dyn EmbeddingClient> = embedder.clone();
    let extractor =
        FeatureExtractor::from_config(&similarity(FeatureMethod::PlainText), Some(client)).unwrap();
    assert_eq!(extractor.method(), FeatureMethod::PlainText);

    let mut tree = TreeBuilder::new().build(&page());
    let vector = extractor.extract(&mut tree).await.unwrap();

    let batches = embedder.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert!(!batches[0][0].contains("src="));
    assert_eq!(vector[0], batches[0][0].chars().count() as f32);
}

#[tokio::test]
async fn bow_vectors_have_configured_dimension() {
    let extractor = FeatureExtractor::from_config(&similarity(FeatureMethod::Bow), None).unwrap();
    let mut tree = TreeBuilder::new().build(&page());
    let vector = extractor.extract(&mut tree).await.unwrap();
    assert_eq!(vector.len(), 1024);
    assert!(vector.iter().any(|&x| x > 0.0));
}

#[test]
fn embedding_methods_require_a_client() {
    let err = FeatureExtractor::from_config(&similarity(FeatureMethod::HtmlStructure), None)
        .unwrap_err();
    assert!(matches!(err, LookalikeError::Config(_)));
}
