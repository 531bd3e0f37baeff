use lookalike_common::{FeatureMethod, LookalikeError, Result};
use lookalike_dom::{PreprocessOptions, TreeBuilder, prepare_page};
use lookalike_features::{CssExtractor, FeatureExtractor, PageFeatures, Scorer, Verdict};
use lookalike_web::PageFetcher;
use std::sync::Arc;

/// Compares two pages by URL.
///
/// One comparison runs sequentially: the first page is fetched and
/// fingerprinted before the second is requested, and a failure on the first
/// page means the second is never fetched.
pub struct PageSimilarity {
    fetcher: Arc<dyn PageFetcher>,
    stylesheet_fetcher: Option<Arc<dyn PageFetcher>>,
    preprocess: PreprocessOptions,
    extractor: FeatureExtractor,
    css: Option<CssExtractor>,
    scorer: Scorer,
}

impl PageSimilarity {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        preprocess: PreprocessOptions,
        extractor: FeatureExtractor,
        scorer: Scorer,
    ) -> Self {
        Self {
            fetcher,
            stylesheet_fetcher: None,
            preprocess,
            extractor,
            css: None,
            scorer,
        }
    }

    /// Fetcher for `<link rel="stylesheet">` targets.
    pub fn with_stylesheet_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.stylesheet_fetcher = Some(fetcher);
        self
    }

    /// Fingerprint stylesheets separately. Ignored while rules are projected
    /// onto the markup.
    pub fn with_css(mut self, css: CssExtractor) -> Self {
        self.css = Some(css);
        self
    }

    pub fn method(&self) -> FeatureMethod {
        self.extractor.method()
    }

    /// Fetch `url` and compute its fingerprint.
    pub async fn page_features(&self, url: &str) -> Result<PageFeatures> {
        let markup = self.fetcher.fetch(url).await?;
        if markup.trim().is_empty() {
            return Err(LookalikeError::Fetch(format!("{url}: empty document")));
        }

        tracing::info!(url, fetcher = self.fetcher.name(), "pipeline.tree.begin");
        let prepared = prepare_page(
            &markup,
            Some(url),
            &self.preprocess,
            self.stylesheet_fetcher.as_deref(),
        )
        .await;
        let mut tree = TreeBuilder::new().build(&prepared.dom);
        tracing::info!(
            url,
            nodes = tree.node_count(),
            method = %self.method(),
            "pipeline.features.begin"
        );

        let vector = self.extractor.extract(&mut tree).await?;
        if vector.is_empty() {
            return Err(LookalikeError::Embedding(format!("{url}: empty feature vector")));
        }
        let css = match &self.css {
            Some(css) if !prepared.projected => Some(css.extract(&prepared.stylesheet)),
            _ => None,
        };
        tracing::info!(url, dim = vector.len(), css = css.is_some(), "pipeline.features.done");
        Ok(PageFeatures { vector, css })
    }

    async fn features_or_log(&self, url: &str) -> Option<PageFeatures> {
        match self.page_features(url).await {
            Ok(features) => Some(features),
            Err(e) => {
                tracing::error!(url, error = %e, "pipeline.features.failed");
                None
            }
        }
    }

    /// Similarity verdict for two pages; any failure yields
    /// [`Verdict::DISSIMILAR`].
    pub async fn compare(&self, url_a: &str, url_b: &str) -> Verdict {
        let Some(a) = self.features_or_log(url_a).await else {
            return Verdict::DISSIMILAR;
        };
        let Some(b) = self.features_or_log(url_b).await else {
            return Verdict::DISSIMILAR;
        };
        match self.scorer.score(&a, &b) {
            Ok(verdict) => {
                tracing::info!(
                    url_a,
                    url_b,
                    similar = verdict.similar,
                    score = verdict.score,
                    "pipeline.compare.done"
                );
                verdict
            }
            Err(e) => {
                tracing::error!(url_a, url_b, error = %e, "pipeline.compare.failed");
                Verdict::DISSIMILAR
            }
        }
    }
}
