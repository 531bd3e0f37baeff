//! Text embedding clients.
//!
//! [`EmbeddingClient`] is the seam the feature extractors depend on;
//! [`OpenAiEmbeddingClient`] talks to the OpenAI embeddings endpoint or an
//! Azure OpenAI deployment.

pub mod openai;
pub mod traits;

pub use openai::OpenAiEmbeddingClient;
pub use traits::EmbeddingClient;
