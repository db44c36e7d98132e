use std::collections::HashMap;
use std::sync::RwLock;

use ragdb_core::types::EmbeddingVector;

pub fn hash_content(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}

/// Embedding cache keyed by `(content_hash, embedder_id)`.
///
/// Consulted before calling a provider and written through on misses, so
/// identical chunk texts are embedded once and re-ingesting an unchanged
/// corpus does no provider work.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<(String, String), EmbeddingVector>>,
}

impl EmbeddingCache {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, content_hash: &str, embedder_id: &str) -> Option<EmbeddingVector> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&(content_hash.to_string(), embedder_id.to_string())).cloned()
    }

    pub fn put(&self, content_hash: String, embedder_id: String, vector: EmbeddingVector) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert((content_hash, embedder_id), vector);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
