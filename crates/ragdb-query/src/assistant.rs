use std::sync::Arc;
use std::time::Duration;

use ragdb_core::config::Settings;
use ragdb_core::error::Result;
use ragdb_core::traits::{EmbeddingProvider, GenerationProvider};
use ragdb_core::types::{Answer, QueryStage, RetrievalResult};

use crate::composer::AnswerComposer;
use crate::corpus::Corpus;
use crate::engine::QueryEngine;
use crate::retry::RetryPolicy;

/// Question answering over the current corpus snapshot.
///
/// Each call pins the snapshot that is current when it starts, so a
/// concurrent ingestion never changes results mid-query.
pub struct Assistant {
    corpus: Arc<Corpus>,
    engine: QueryEngine,
    composer: AnswerComposer,
    top_k: usize,
}

impl Assistant {
    pub fn new(corpus: Arc<Corpus>, engine: QueryEngine, composer: AnswerComposer) -> Self {
        Self { corpus, engine, composer, top_k: 1 }
    }

    pub fn from_settings(
        settings: &Settings,
        corpus: Arc<Corpus>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        let embed_retry =
            RetryPolicy::from_settings(&settings.retry, Some(Duration::from_millis(settings.embedding.timeout_ms)));
        let generate_retry =
            RetryPolicy::from_settings(&settings.retry, Some(Duration::from_millis(settings.generation.timeout_ms)));
        let engine = QueryEngine::new(embedder).with_retry(embed_retry);
        let composer = AnswerComposer::new(generator)
            .with_retry(generate_retry)
            .with_context_chunks(settings.query.context_chunks);
        Self::new(corpus, engine, composer).with_top_k(settings.query.top_k)
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        let snapshot = self.corpus.snapshot();
        tracing::debug!(stage = ?QueryStage::Received, version = snapshot.version(), "query");
        self.engine.retrieve(&snapshot, query, k).await.inspect_err(|e| {
            tracing::warn!(stage = ?QueryStage::Failed, "retrieval failed: {}", e);
        })
    }

    pub async fn ask(&self, query: &str) -> Result<Answer> {
        self.ask_with_k(query, self.top_k).await
    }

    pub async fn ask_with_k(&self, query: &str, k: usize) -> Result<Answer> {
        let results = self.retrieve(query, k).await?;
        let answer = self.composer.answer(query, &results).await.inspect_err(|e| {
            tracing::warn!(stage = ?QueryStage::Failed, "generation failed: {}", e);
        })?;
        tracing::info!(stage = ?QueryStage::Answered, chunk = %answer.provenance.chunk.id, "answered");
        Ok(answer)
    }
}
