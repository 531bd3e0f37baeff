//! Page acquisition behind the [`PageFetcher`] trait.
//!
//! Two implementations ship with the crate: [`HttpFetcher`] performs plain
//! GET requests with browser-like headers, [`BrowserFetcher`] drives a
//! WebDriver session so client-side rendering has run before the markup is
//! read back.

pub mod browser;
pub mod fetcher;

pub use browser::BrowserFetcher;
pub use fetcher::HttpFetcher;

use async_trait::async_trait;
use lookalike_common::Result;

/// Retrieves raw markup for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the document at `url`. An empty body is returned as-is; callers
    /// decide whether that counts as a failure.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Fetch a linked stylesheet. Implementations may use a tighter budget
    /// than for pages.
    async fn fetch_stylesheet(&self, url: &str) -> Result<String> {
        self.fetch(url).await
    }

    /// Short label for logs.
    fn name(&self) -> &'static str;
}
