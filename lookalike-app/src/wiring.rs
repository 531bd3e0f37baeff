use crate::PageSimilarity;
use lookalike_common::{LookalikeError, Result};
use lookalike_config::{FetchMethod, TaskConfig};
use lookalike_dom::PreprocessOptions;
use lookalike_embed::{EmbeddingClient, OpenAiEmbeddingClient};
use lookalike_features::{CssExtractor, FeatureExtractor, Scorer};
use lookalike_web::{BrowserFetcher, HttpFetcher, PageFetcher};
use std::sync::Arc;
use std::time::Duration;

/// Embedding client for methods that need one; `None` for bag-of-words.
pub fn build_embedder(cfg: &TaskConfig) -> Result<Option<Arc<dyn EmbeddingClient>>> {
    if !cfg.similarity_model.method.needs_embeddings() {
        return Ok(None);
    }
    let Some(embedding) = &cfg.embedding else {
        return Err(LookalikeError::Config(format!(
            "method {} requires an embedding section",
            cfg.similarity_model.method
        )));
    };
    let client: Arc<dyn EmbeddingClient> = Arc::new(OpenAiEmbeddingClient::from_config(embedding)?);
    tracing::debug!(model = client.model_name(), "wiring.embedder.ready");
    Ok(Some(client))
}

pub fn build_from_config(cfg: &TaskConfig) -> Result<PageSimilarity> {
    let http = Arc::new(HttpFetcher::new()?);
    let fetcher: Arc<dyn PageFetcher> = match cfg.html.fetch_method {
        FetchMethod::Http => http.clone(),
        FetchMethod::Webdriver => Arc::new(
            BrowserFetcher::new(
                cfg.html.webdriver_url.clone(),
                Duration::from_secs(cfg.html.page_timeout_secs),
            )
            .with_headless(cfg.html.headless),
        ),
    };

    let extractor = FeatureExtractor::from_config(&cfg.similarity_model, build_embedder(cfg)?)?;
    let mut pipeline = PageSimilarity::new(
        fetcher,
        PreprocessOptions::from(&cfg.html),
        extractor,
        Scorer::from_config(&cfg.similarity_model),
    );
    if cfg.html.get_remote_css {
        pipeline = pipeline.with_stylesheet_fetcher(http);
    }
    if !cfg.html.include_css_in_html {
        pipeline = pipeline.with_css(CssExtractor::new(cfg.similarity_model.feature_dim_bow));
    }

    tracing::debug!(
        fetch_method = ?cfg.html.fetch_method,
        method = %pipeline.method(),
        remote_css = cfg.html.get_remote_css,
        css_in_html = cfg.html.include_css_in_html,
        "wiring.pipeline.ready"
    );
    Ok(pipeline)
}
