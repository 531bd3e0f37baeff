use crate::traits::EmbeddingClient;
use async_trait::async_trait;
use lookalike_common::{LookalikeError, Result};
use lookalike_config::{EmbeddingConfig, EmbeddingProvider};
use lookalike_http::{Auth, HttpClient, HttpError, RequestOpts};
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embeddings over the OpenAI REST API, either directly or through an Azure deployment.
pub struct OpenAiEmbeddingClient {
    client: HttpClient,
    provider: EmbeddingProvider,
    api_key: String,
    api_version: Option<String>,
    model: String,
    max_text_len: usize,
    max_batch: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl OpenAiEmbeddingClient {
    pub fn from_config(cfg: &EmbeddingConfig) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with '/'.
        let mut base = cfg.endpoint.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let client = HttpClient::new(&base)
            .map_err(|e| LookalikeError::Config(format!("embedding endpoint: {e}")))?
            .with_timeout(Duration::from_secs(cfg.timeout_secs));

        if cfg.provider == EmbeddingProvider::Azure && cfg.api_version.is_none() {
            return Err(LookalikeError::Config(
                "azure embeddings require embedding.api_version".into(),
            ));
        }

        Ok(Self {
            client,
            provider: cfg.provider,
            api_key: cfg.api_key.clone(),
            api_version: cfg.api_version.clone(),
            model: cfg.model.clone(),
            max_text_len: cfg.max_text_len.max(1),
            max_batch: cfg.max_batch.max(1),
        })
    }

    fn path(&self) -> String {
        match self.provider {
            EmbeddingProvider::Azure => format!("openai/deployments/{}/embeddings", self.model),
            EmbeddingProvider::Openai => "embeddings".to_string(),
        }
    }

    fn truncate(&self, text: &str) -> String {
        text.chars().take(self.max_text_len).collect()
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut opts = RequestOpts::default();
        let req = match self.provider {
            EmbeddingProvider::Azure => {
                let value = HeaderValue::from_str(self.api_key.trim())
                    .map_err(|e| LookalikeError::Config(format!("invalid api key: {e}")))?;
                opts.auth = Some(Auth::Header {
                    name: HeaderName::from_static("api-key"),
                    value,
                });
                if let Some(version) = &self.api_version {
                    opts.query = Some(vec![("api-version", version.as_str().into())]);
                }
                EmbeddingRequest {
                    input: chunk,
                    model: None,
                }
            }
            EmbeddingProvider::Openai => {
                opts.auth = Some(Auth::Bearer(&self.api_key));
                EmbeddingRequest {
                    input: chunk,
                    model: Some(self.model.as_str()),
                }
            }
        };

        let resp: EmbeddingResponse = self
            .client
            .post_json_opts(&self.path(), &req, opts)
            .await
            .map_err(http_to_lookalike)?;

        if resp.data.len() != chunk.len() {
            return Err(LookalikeError::Embedding(format!(
                "requested {} embeddings, received {}",
                chunk.len(),
                resp.data.len()
            )));
        }
        let mut data = resp.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let truncated: Vec<String> = texts.iter().map(|t| self.truncate(t)).collect();

        let mut out = Vec::with_capacity(truncated.len());
        for chunk in truncated.chunks(self.max_batch) {
            tracing::debug!(
                model = %self.model,
                inputs = chunk.len(),
                "embedding.request"
            );
            out.extend(self.embed_chunk(chunk).await?);
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_lookalike(e: HttpError) -> LookalikeError {
    match e {
        HttpError::Timeout(_) => LookalikeError::Timeout,
        other => LookalikeError::Embedding(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: EmbeddingProvider) -> EmbeddingConfig {
        EmbeddingConfig {
            provider,
            api_key: "key".into(),
            endpoint: "https://example.openai.azure.com".into(),
            api_version: Some("2024-02-01".into()),
            model: "ada".into(),
            max_text_len: 4,
            max_batch: 2,
            timeout_secs: 5,
        }
    }

    #[test]
    fn truncates_by_characters_not_bytes() {
        let client = OpenAiEmbeddingClient::from_config(&config(EmbeddingProvider::Azure)).unwrap();
        assert_eq!(client.truncate("网页相似度检测"), "网页相似");
        assert_eq!(client.truncate("ab"), "ab");
    }

    #[test]
    fn path_depends_on_provider() {
        let azure = OpenAiEmbeddingClient::from_config(&config(EmbeddingProvider::Azure)).unwrap();
        assert_eq!(azure.path(), "openai/deployments/ada/embeddings");
        let openai =
            OpenAiEmbeddingClient::from_config(&config(EmbeddingProvider::Openai)).unwrap();
        assert_eq!(openai.path(), "embeddings");
    }

    #[test]
    fn azure_without_version_is_rejected() {
        let mut cfg = config(EmbeddingProvider::Azure);
        cfg.api_version = None;
        assert!(matches!(
            OpenAiEmbeddingClient::from_config(&cfg),
            Err(LookalikeError::Config(_))
        ));
    }
}
