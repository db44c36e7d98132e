use std::sync::Arc;

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::EmbeddingProvider;
use ragdb_core::types::{QueryStage, RetrievalResult};

use crate::corpus::Snapshot;
use crate::retry::{CallKind, RetryPolicy};

/// Embeds a query, searches a snapshot and resolves hits to their chunks.
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    retry: RetryPolicy,
}

impl QueryEngine {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder, retry: RetryPolicy::default() }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// All-or-nothing: any failure aborts the query with no partial results.
    pub async fn retrieve(&self, snapshot: &Snapshot, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        // checked before embedding so an empty corpus never costs a provider call
        if snapshot.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let vector = self.retry.run(CallKind::Embedding, "embed query", || self.embedder.embed(query)).await?;
        tracing::debug!(stage = ?QueryStage::Embedded, dim = vector.len());

        let hits = snapshot.index().search(&vector, k)?;
        let results = hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| {
                let chunk = snapshot.chunk(&hit.chunk_id).ok_or_else(|| Error::IndexConsistency(hit.chunk_id.clone()))?;
                Ok(RetrievalResult { chunk: chunk.clone(), score: hit.distance, rank })
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(stage = ?QueryStage::Retrieved, hits = results.len());
        Ok(results)
    }
}
