//! ragdb-embed
//!
//! Embedding provider adapters. The model itself is an external collaborator;
//! these types only speak the [`EmbeddingProvider`] contract.

use std::sync::Arc;
use std::time::Duration;

use ragdb_core::config::EmbeddingSettings;
use ragdb_core::error::{Error, Result};
use ragdb_core::traits::EmbeddingProvider;

mod hash;
mod ollama;

pub use hash::HashEmbedder;
pub use ollama::OllamaEmbedder;

/// Build the configured provider. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// offline [`HashEmbedder`] regardless of configuration.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    build_embedder(settings, use_fake)
}

/// Same as [`get_default_embedder`] with the fake-embedding switch passed in.
pub fn build_embedder(settings: &EmbeddingSettings, use_fake: bool) -> Result<Arc<dyn EmbeddingProvider>> {
    if use_fake || settings.provider == "hash" {
        tracing::info!("Using HashEmbedder (dim={})", settings.dim);
        return Ok(Arc::new(HashEmbedder::new(settings.dim)));
    }
    match settings.provider.as_str() {
        "ollama" => {
            tracing::info!("Using Ollama embeddings: model={} url={}", settings.model, settings.base_url);
            let embedder = OllamaEmbedder::new(&settings.base_url, &settings.model, settings.dim, Duration::from_millis(settings.timeout_ms))?;
            Ok(Arc::new(embedder))
        }
        other => Err(Error::Config(format!("unknown embedding provider '{other}'"))),
    }
}
