//! Page preparation: tag filtering, stylesheet collection and conversion.

use crate::generic::GenericDom;
use crate::page::PageDom;
use crate::stylesheet::{parse_stylesheet, StyleSheetMap};
use lookalike_config::HtmlConfig;
use lookalike_web::PageFetcher;

/// DOM preprocessing switches, usually taken from [`HtmlConfig`].
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    pub filter_tags: Vec<String>,
    pub css_tags: Vec<String>,
    pub fetch_remote_css: bool,
    /// Project stylesheet rules onto elements instead of keeping CSS separate.
    pub include_inline: bool,
}

impl From<&HtmlConfig> for PreprocessOptions {
    fn from(cfg: &HtmlConfig) -> Self {
        Self {
            filter_tags: cfg.filter_tags.clone(),
            css_tags: cfg.css_tags.clone(),
            fetch_remote_css: cfg.get_remote_css,
            include_inline: cfg.include_css_in_html,
        }
    }
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self::from(&HtmlConfig::default())
    }
}

/// Output of [`prepare_page`].
#[derive(Debug, Clone)]
pub struct PreparedPage {
    pub dom: GenericDom,
    pub stylesheet: StyleSheetMap,
    /// Whether `stylesheet` was already projected onto `dom`.
    pub projected: bool,
}

/// Collect stylesheet rules from the listed tags (detaching them) and,
/// when asked, from linked stylesheets fetched best effort.
pub async fn extract_stylesheets(
    page: &mut PageDom,
    style_tags: &[String],
    fetch_remote_css: bool,
    fetcher: Option<&dyn PageFetcher>,
) -> StyleSheetMap {
    let mut sheet = StyleSheetMap::default();
    for source in page.take_inline_styles(style_tags) {
        sheet.merge(parse_stylesheet(&source));
    }

    if fetch_remote_css {
        match fetcher {
            Some(fetcher) => {
                for link in page.stylesheet_links() {
                    match fetcher.fetch_stylesheet(&link).await {
                        Ok(css) if !css.is_empty() => sheet.merge(parse_stylesheet(&css)),
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!(url = %link, error = %e, "dom.styles.remote_failed")
                        }
                    }
                }
            }
            None => tracing::debug!("dom.styles.remote_skipped_no_fetcher"),
        }
    }

    tracing::debug!(rules = sheet.len(), "dom.styles.collected");
    sheet
}

/// Parse `markup`, drop filtered tags, collect CSS and convert to a [`GenericDom`].
pub async fn prepare_page(
    markup: &str,
    page_url: Option<&str>,
    options: &PreprocessOptions,
    fetcher: Option<&dyn PageFetcher>,
) -> PreparedPage {
    let mut page = PageDom::parse(markup);
    if let Some(url) = page_url {
        page = page.with_base_url(url);
    }
    let removed = page.filter(&options.filter_tags);
    tracing::debug!(removed, "dom.filter.done");

    let stylesheet =
        extract_stylesheets(&mut page, &options.css_tags, options.fetch_remote_css, fetcher).await;
    let dom = if options.include_inline {
        page.to_generic(Some(&stylesheet))
    } else {
        page.to_generic(None)
    };

    PreparedPage {
        dom,
        stylesheet,
        projected: options.include_inline,
    }
}
