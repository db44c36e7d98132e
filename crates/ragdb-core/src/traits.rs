use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EmbeddingVector, IndexEntry, SearchHit};

/// Text to vector service. Calls may fail, block on I/O, and are not assumed
/// to be deterministic.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hash:xx64:d384`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;
}

/// Text to text service used by the answer composer.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Nearest-neighbour store over unit-normalized vectors.
///
/// Implementations keep entries in insertion order; `search` results are
/// ordered by ascending distance with ties going to the older entry.
pub trait VectorIndex: Send + Sync {
    /// Dimension fixed by the first non-empty insert.
    fn dim(&self) -> Option<usize>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn insert(&mut self, entries: Vec<IndexEntry>) -> Result<()>;
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>>;
    /// Build any lazily derived search structure up front so the first query
    /// does not pay for it.
    fn prepare(&self) {}
    /// Stored entries (normalized) in insertion order.
    fn entries(&self) -> &[IndexEntry];
}
