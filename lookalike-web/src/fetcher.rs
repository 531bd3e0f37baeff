use crate::PageFetcher;
use async_trait::async_trait;
use lookalike_common::{LookalikeError, Result};
use lookalike_http::{HttpClient, HttpError, RequestOpts};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Plain HTTP page fetcher: three attempts, two seconds each. Any
/// non-success status is retried.
#[derive(Clone)]
pub struct HttpFetcher {
    client: HttpClient,
    headers: HeaderMap,
    stylesheet_timeout: Duration,
}

impl HttpFetcher {
    pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);
    pub const RETRIES: usize = 2;

    pub fn new() -> Result<Self> {
        let client = HttpClient::detached()
            .map_err(|e| LookalikeError::Fetch(format!("HttpClient init failed: {e}")))?
            .with_timeout(Self::ATTEMPT_TIMEOUT)
            .with_retries(Self::RETRIES);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json,text/plain,*/*",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));

        Ok(Self {
            client,
            headers,
            stylesheet_timeout: Duration::from_secs(1),
        })
    }

    async fn get(
        &self,
        url: &str,
        timeout: Option<Duration>,
        retries: Option<usize>,
    ) -> Result<String> {
        let opts = RequestOpts {
            timeout,
            retries,
            headers: Some(self.headers.clone()),
            retry_any_status: true,
            ..Default::default()
        };
        self.client.get_text(url, opts).await.map_err(|e| match e {
            HttpError::Timeout(_) => LookalikeError::Timeout,
            other => LookalikeError::Fetch(format!("{url}: {other}")),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let html = self.get(url, None, None).await?;
        tracing::debug!(url, bytes = html.len(), "fetch.http.done");
        Ok(html)
    }

    async fn fetch_stylesheet(&self, url: &str) -> Result<String> {
        self.get(url, Some(self.stylesheet_timeout), Some(0)).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
