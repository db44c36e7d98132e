use std::sync::Arc;

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::GenerationProvider;
use ragdb_core::types::{Answer, RetrievalResult};

use crate::retry::{CallKind, RetryPolicy};

/// Builds the context-augmented prompt and delegates to a generator.
pub struct AnswerComposer {
    generator: Arc<dyn GenerationProvider>,
    retry: RetryPolicy,
    context_chunks: usize,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn GenerationProvider>) -> Self {
        Self { generator, retry: RetryPolicy::default(), context_chunks: 1 }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of top results placed in the context, in ranked order.
    pub fn with_context_chunks(mut self, n: usize) -> Self {
        self.context_chunks = n.max(1);
        self
    }

    pub fn build_prompt(&self, query: &str, results: &[RetrievalResult]) -> Result<String> {
        if results.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let mut ranked: Vec<&RetrievalResult> = results.iter().collect();
        ranked.sort_by(|a, b| a.rank.cmp(&b.rank));
        let context = ranked.iter().take(self.context_chunks).map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
        Ok(format!("Context: {context}\n\nQuestion: {query}\nAnswer:"))
    }

    /// The generator's text is returned as-is together with the top-ranked
    /// chunk's provenance. Generator failures are surfaced, never papered over.
    pub async fn answer(&self, query: &str, results: &[RetrievalResult]) -> Result<Answer> {
        let prompt = self.build_prompt(query, results)?;
        let provenance = results.iter().min_by_key(|r| r.rank).cloned().ok_or(Error::EmptyIndex)?;
        let text = self
            .retry
            .run(CallKind::Generation, self.generator.name(), || self.generator.generate(&prompt))
            .await?;
        Ok(Answer { text, provenance, prompt })
    }
}
