use crate::PageFetcher;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use lookalike_common::{LookalikeError, Result};
use serde_json::json;
use std::time::Duration;
use webdriver::capabilities::Capabilities;

/// Fetches pages through a WebDriver session (Chromedriver by default).
///
/// Each fetch opens its own session and closes it afterwards. Navigation is
/// attempted once, bounded by `page_timeout`, then the page gets a fixed
/// settle delay before its source is read.
pub struct BrowserFetcher {
    webdriver_url: String,
    page_timeout: Duration,
    settle: Duration,
    headless: bool,
}

impl BrowserFetcher {
    pub fn new(webdriver_url: impl Into<String>, page_timeout: Duration) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            page_timeout,
            settle: Duration::from_secs(1),
            headless: true,
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    async fn connect(&self) -> Result<Client> {
        ClientBuilder::native()
            .capabilities(chrome_capabilities(self.headless))
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| {
                LookalikeError::Fetch(format!(
                    "webdriver session at {} failed: {e}",
                    self.webdriver_url
                ))
            })
    }

    async fn load(&self, client: &Client, url: &str) -> Result<String> {
        match tokio::time::timeout(self.page_timeout, client.goto(url)).await {
            Err(_) => return Err(LookalikeError::Timeout),
            Ok(Err(e)) => return Err(LookalikeError::Fetch(format!("{url}: {e}"))),
            Ok(Ok(())) => {}
        }
        tokio::time::sleep(self.settle).await;
        client
            .source()
            .await
            .map_err(|e| LookalikeError::Fetch(format!("{url}: reading page source: {e}")))
    }
}

/// Chrome capabilities used for every session.
pub fn chrome_capabilities(headless: bool) -> Capabilities {
    let mut args = vec![json!("--no-sandbox"), json!("--disable-dev-shm-usage")];
    if headless {
        args.push(json!("--headless"));
        args.push(json!("--disable-gpu"));
    }
    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let client = self.connect().await?;
        let outcome = self.load(&client, url).await;
        // Always attempt to close the session before returning.
        if let Err(e) = client.close().await {
            tracing::debug!(url, error = %e, "fetch.webdriver.close_failed");
        }
        if let Ok(html) = &outcome {
            tracing::debug!(url, bytes = html.len(), "fetch.webdriver.done");
        }
        outcome
    }

    fn name(&self) -> &'static str {
        "webdriver"
    }
}
