use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use ragdb_core::error::Result;
use ragdb_core::traits::EmbeddingProvider;
use ragdb_core::types::EmbeddingVector;

/// Deterministic offline embedder: whitespace tokens are hashed into `dim`
/// buckets and the result is L2-normalized. Texts sharing words land close
/// together, which is enough for tests and for running without a model.
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    /// `dim` is clamped to at least one bucket.
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("hash:xx64:d{dim}") }
    }

    pub fn embed_sync(&self, text: &str) -> EmbeddingVector {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        Ok(self.embed_sync(text))
    }
}
