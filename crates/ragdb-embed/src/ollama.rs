//! Embeddings served by a local or remote Ollama daemon.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::EmbeddingProvider;
use ragdb_core::types::EmbeddingVector;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dim: usize,
    id: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, dim: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dim,
            id: format!("ollama:{model}:d{dim}"),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest { model: &self.model, prompt: text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() { Error::provider(format!("timeout after request to {}", self.endpoint)) }
                else { Error::provider(format!("request failed: {e}")) }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(format!("HTTP {status}: {}", body.trim())));
        }
        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("malformed response: {e}")))?;
        if parsed.embedding.is_empty() {
            return Err(Error::provider("malformed response: empty embedding"));
        }
        Ok(parsed.embedding)
    }
}
