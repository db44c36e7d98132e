//! Corpus ingestion: chunk, embed concurrently, insert, publish.
//!
//! Chunks whose embedding fails (after retries), comes back malformed, or
//! whose insert batch is rejected are recorded as skipped; the corpus still
//! reaches `Ready`.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ragdb_core::config::{IngestSettings, Settings};
use ragdb_core::error::{Error, Result};
use ragdb_core::traits::EmbeddingProvider;
use ragdb_core::types::{Chunk, Document, IndexEntry, IngestReport, SkippedChunk};
use ragdb_core::Chunker;
use ragdb_vector::{hash_content, new_index, EmbeddingCache};

use crate::corpus::{Corpus, Snapshot};
use crate::retry::{CallKind, RetryPolicy};

pub struct IngestPipeline {
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    cache: Arc<EmbeddingCache>,
    retry: RetryPolicy,
    concurrency: usize,
    index_settings: IngestSettings,
    show_progress: bool,
}

impl IngestPipeline {
    pub fn new(chunker: Chunker, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            chunker,
            embedder,
            cache: Arc::new(EmbeddingCache::new()),
            retry: RetryPolicy::default(),
            concurrency: 8,
            index_settings: IngestSettings::default(),
            show_progress: false,
        }
    }

    pub fn from_settings(settings: &Settings, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        settings.validate()?;
        let chunker = Chunker::new(settings.chunking.max_length, settings.chunking.overlap)?;
        let timeout = Duration::from_millis(settings.embedding.timeout_ms);
        Ok(Self::new(chunker, embedder)
            .with_retry(RetryPolicy::from_settings(&settings.retry, Some(timeout)))
            .with_concurrency(settings.embedding.concurrency)
            .with_index_settings(settings.ingest.clone()))
    }

    pub fn with_cache(mut self, cache: Arc<EmbeddingCache>) -> Self { self.cache = cache; self }
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self { self.retry = retry; self }
    pub fn with_concurrency(mut self, concurrency: usize) -> Self { self.concurrency = concurrency.max(1); self }
    pub fn with_index_settings(mut self, settings: IngestSettings) -> Self { self.index_settings = settings; self }
    /// Draw a terminal progress bar while embedding.
    pub fn with_progress(mut self, show: bool) -> Self { self.show_progress = show; self }

    pub fn cache(&self) -> &EmbeddingCache { &self.cache }

    /// Ingest `documents` as the next corpus version and publish it.
    pub async fn ingest(&self, corpus: &Corpus, documents: &[Document]) -> Result<IngestReport> {
        let previous = corpus.begin_ingest();
        match self.build_snapshot(documents, corpus.next_version()).await {
            Ok(snapshot) => {
                let report = snapshot.report().clone();
                corpus.publish(snapshot);
                Ok(report)
            }
            Err(e) => {
                corpus.abort_ingest(previous);
                Err(e)
            }
        }
    }

    /// Build a snapshot without publishing it.
    pub async fn build_snapshot(&self, documents: &[Document], version: u64) -> Result<Snapshot> {
        let started = Instant::now();
        let documents = dedupe_documents(documents);
        let chunks = self.chunker.chunk_all(&documents);
        tracing::info!("Chunked {} documents into {} chunks", documents.len(), chunks.len());

        let hashes: Vec<String> = chunks.iter().map(|c| hash_content(&c.text)).collect();
        let failures = self.embed_missing(&chunks, &hashes).await;

        let mut skipped = Vec::new();
        let mut ready: Vec<(Chunk, IndexEntry)> = Vec::with_capacity(chunks.len());
        for (chunk, hash) in chunks.into_iter().zip(&hashes) {
            match self.cache.get(hash, self.embedder.embedder_id()) {
                Some(vector) => {
                    let entry = IndexEntry::new(chunk.id.clone(), vector);
                    ready.push((chunk, entry));
                }
                None => {
                    let reason = failures.get(hash).cloned().unwrap_or_else(|| "embedding unavailable".to_string());
                    tracing::warn!("Skipping chunk {}: {}", chunk.id, reason);
                    skipped.push(SkippedChunk { chunk_id: chunk.id, reason });
                }
            }
        }

        let total_chunks = ready.len() + skipped.len();
        let mut index = new_index(&self.index_settings);
        let mut indexed_chunks = Vec::with_capacity(ready.len());
        let batch_size = self.index_settings.batch_size.max(1);
        while !ready.is_empty() {
            let rest = ready.split_off(batch_size.min(ready.len()));
            let batch = std::mem::replace(&mut ready, rest);
            let (batch_chunks, entries): (Vec<Chunk>, Vec<IndexEntry>) = batch.into_iter().unzip();
            match index.insert(entries) {
                Ok(()) => indexed_chunks.extend(batch_chunks),
                Err(e @ Error::Dimension { .. }) => {
                    tracing::warn!("Rejected insert batch of {} chunks: {}", batch_chunks.len(), e);
                    skipped.extend(batch_chunks.into_iter().map(|c| SkippedChunk { chunk_id: c.id, reason: e.to_string() }));
                }
                Err(e) => return Err(e),
            }
        }

        let report = IngestReport { documents: documents.len(), chunks: total_chunks, indexed: indexed_chunks.len(), skipped };
        tracing::info!(
            "Built snapshot v{}: {} indexed, {} skipped in {:.2?}",
            version,
            report.indexed,
            report.skipped.len(),
            started.elapsed()
        );
        Ok(Snapshot::new(version, index, indexed_chunks, report))
    }

    /// Embed every distinct chunk text not already cached. Returns the failure
    /// reason per content hash for texts that could not be embedded.
    async fn embed_missing(&self, chunks: &[Chunk], hashes: &[String]) -> HashMap<String, String> {
        let embedder_id = self.embedder.embedder_id().to_string();
        let mut seen = HashSet::new();
        let pending: Vec<(&str, &str)> = chunks
            .iter()
            .zip(hashes)
            .filter(|(_, h)| seen.insert(h.as_str()))
            .filter(|(_, h)| self.cache.get(h, &embedder_id).is_none())
            .map(|(c, h)| (h.as_str(), c.text.as_str()))
            .collect();
        if pending.is_empty() {
            return HashMap::new();
        }
        tracing::info!("Embedding {} distinct texts (concurrency {})", pending.len(), self.concurrency);

        let pb = self.progress_bar(pending.len());
        let embedder = &self.embedder;
        let retry = &self.retry;
        let results: Vec<(&str, Result<Vec<f32>>)> = stream::iter(pending)
            .map(|(hash, text)| async move {
                let outcome = retry.run(CallKind::Embedding, "embed", || embedder.embed(text)).await;
                (hash, outcome)
            })
            .buffered(self.concurrency)
            .inspect(|_| pb.inc(1))
            .collect()
            .await;
        pb.finish_with_message("embedded");

        let dim = self.embedder.dim();
        let mut failures = HashMap::new();
        for (hash, outcome) in results {
            match outcome.and_then(|vector| check_output(vector, dim)) {
                Ok(vector) => self.cache.put(hash.to_string(), embedder_id.clone(), vector),
                Err(e) => {
                    failures.insert(hash.to_string(), e.to_string());
                }
            }
        }
        failures
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Provider output must be non-empty and of the advertised dimension; a bad
/// vector is a provider failure for that chunk and never reaches the cache.
fn check_output(vector: Vec<f32>, dim: usize) -> Result<Vec<f32>> {
    if vector.is_empty() {
        return Err(Error::provider("malformed output: empty embedding"));
    }
    if vector.len() != dim {
        return Err(Error::provider(format!("malformed output: expected {dim} components, got {}", vector.len())));
    }
    Ok(vector)
}

/// Keeps the first document for each id; chunk ids derive from document ids
/// and the index must not hold the same chunk twice.
fn dedupe_documents(documents: &[Document]) -> Vec<Document> {
    let mut seen = HashSet::new();
    documents
        .iter()
        .filter(|d| {
            let fresh = seen.insert(d.id.as_str());
            if !fresh {
                tracing::warn!("Ignoring duplicate document id {}", d.id);
            }
            fresh
        })
        .cloned()
        .collect()
}
