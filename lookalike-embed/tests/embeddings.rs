mod common;

use lookalike_common::LookalikeError;
use lookalike_config::{EmbeddingConfig, EmbeddingProvider};
use lookalike_embed::{EmbeddingClient, OpenAiEmbeddingClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, provider: EmbeddingProvider) -> EmbeddingConfig {
    EmbeddingConfig {
        provider,
        api_key: "test-key".into(),
        endpoint: server.uri(),
        api_version: Some("2024-02-01".into()),
        model: "ada".into(),
        max_text_len: 8,
        max_batch: 2,
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn azure_batches_are_chunked_truncated_and_reordered() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/ada/embeddings"))
        .and(header("api-key", "test-key"))
        .and(query_param("api-version", "2024-02-01"))
        .and(body_json(json!({"input": ["<div></d", "<p></p>"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"embedding": [0.0, 1.0], "index": 1},
                {"embedding": [1.0, 0.0], "index": 0}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/ada/embeddings"))
        .and(body_json(json!({"input": ["<a></a>"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.5, 0.5], "index": 0}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        OpenAiEmbeddingClient::from_config(&config(&server, EmbeddingProvider::Azure)).unwrap();
    let texts = vec![
        "<div></div>".to_string(),
        "<p></p>".to_string(),
        "<a></a>".to_string(),
    ];
    let vectors = client.embed_batch(&texts).await.unwrap();

    assert_eq!(
        vectors,
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]
    );
}

#[tokio::test]
async fn openai_single_text_uses_bearer_and_model() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({"input": ["hello"], "model": "ada"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.25, 0.75], "index": 0}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        OpenAiEmbeddingClient::from_config(&config(&server, EmbeddingProvider::Openai)).unwrap();
    assert_eq!(client.embed("hello").await.unwrap(), vec![0.25, 0.75]);
    assert_eq!(client.model_name(), "ada");
}

#[tokio::test]
async fn count_mismatch_is_an_embedding_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let client =
        OpenAiEmbeddingClient::from_config(&config(&server, EmbeddingProvider::Openai)).unwrap();
    let err = client.embed("hello").await.unwrap_err();
    assert!(matches!(err, LookalikeError::Embedding(_)));
}

#[tokio::test]
async fn api_errors_surface_the_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": {"message": "input too long"}})),
        )
        .mount(&server)
        .await;

    let client =
        OpenAiEmbeddingClient::from_config(&config(&server, EmbeddingProvider::Openai)).unwrap();
    let err = client.embed("hello").await.unwrap_err();
    assert!(err.to_string().contains("input too long"));
}

#[tokio::test]
async fn empty_batch_makes_no_request() {
    let server = MockServer::start().await;
    let client =
        OpenAiEmbeddingClient::from_config(&config(&server, EmbeddingProvider::Openai)).unwrap();
    assert!(client.embed_batch(&[]).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn azure_embedding_smoketest() {
    common::init_test_tracing();
    let key = std::env::var("AZURE_OPENAI_API_KEY").expect("AZURE_OPENAI_API_KEY");
    let endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").expect("AZURE_OPENAI_ENDPOINT");
    let cfg = EmbeddingConfig {
        provider: EmbeddingProvider::Azure,
        api_key: key,
        endpoint,
        api_version: Some("2024-02-01".into()),
        model: "text-embedding-ada-002".into(),
        max_text_len: 8000,
        max_batch: 16,
        timeout_secs: 30,
    };
    let client = OpenAiEmbeddingClient::from_config(&cfg).unwrap();
    let v = client.embed("<html><body>ok</body></html>").await.unwrap();
    assert!(!v.is_empty());
}
