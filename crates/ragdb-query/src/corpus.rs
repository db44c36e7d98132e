//! Immutable index snapshots and the swappable "current corpus" handle.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use ragdb_core::config::IngestSettings;
use ragdb_core::error::{Error, Result};
use ragdb_core::traits::VectorIndex;
use ragdb_core::types::{Chunk, ChunkId, CorpusState, IngestReport};
use ragdb_vector::{new_index, read_records, write_records, FlatIndex, PersistedRecord};

/// One corpus version: a built index plus the chunk table its ids resolve
/// against. Never mutated once constructed.
pub struct Snapshot {
    version: u64,
    index: Box<dyn VectorIndex>,
    chunks: HashMap<ChunkId, Chunk>,
    report: IngestReport,
}

impl Snapshot {
    pub fn new(version: u64, index: Box<dyn VectorIndex>, chunks: Vec<Chunk>, report: IngestReport) -> Self {
        index.prepare();
        let chunks = chunks.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self { version, index, chunks, report }
    }

    pub fn empty() -> Self {
        Self::new(0, Box::new(FlatIndex::new()), Vec::new(), IngestReport::default())
    }

    pub fn version(&self) -> u64 { self.version }
    pub fn index(&self) -> &dyn VectorIndex { self.index.as_ref() }
    pub fn report(&self) -> &IngestReport { &self.report }
    pub fn len(&self) -> usize { self.index.len() }
    pub fn is_empty(&self) -> bool { self.index.is_empty() }

    pub fn chunk(&self, id: &str) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// Write every entry, in insertion order, as a JSON Lines record.
    pub fn save(&self, path: &Path) -> Result<usize> {
        let records = self
            .index
            .entries()
            .iter()
            .map(|entry| {
                let chunk = self.chunk(&entry.chunk_id).ok_or_else(|| Error::IndexConsistency(entry.chunk_id.clone()))?;
                Ok(PersistedRecord::from_parts(entry, chunk))
            })
            .collect::<Result<Vec<_>>>()?;
        write_records(path, &records)
    }

    /// Rebuild a snapshot by inserting every persisted record in file order.
    pub fn load(path: &Path, settings: &IngestSettings, version: u64) -> Result<Self> {
        let records = read_records(path)?;
        let mut index = new_index(settings);
        let mut entries = Vec::with_capacity(records.len());
        let mut chunks = Vec::with_capacity(records.len());
        for record in records {
            let (entry, chunk) = record.into_parts();
            entries.push(entry);
            chunks.push(chunk);
        }
        index.insert(entries)?;
        let report = IngestReport {
            documents: chunks.iter().map(|c| c.source_document_id.as_str()).collect::<std::collections::HashSet<_>>().len(),
            chunks: chunks.len(),
            indexed: chunks.len(),
            skipped: Vec::new(),
        };
        tracing::info!("Loaded snapshot with {} entries from {}", report.indexed, path.display());
        Ok(Self::new(version, index, chunks, report))
    }
}

/// Handle to the current snapshot.
///
/// Readers take an `Arc` clone and query it without holding any lock;
/// publishing a new version is a single pointer assignment.
pub struct Corpus {
    current: RwLock<Arc<Snapshot>>,
    state: Mutex<CorpusState>,
}

impl Default for Corpus {
    fn default() -> Self { Self::new() }
}

impl Corpus {
    pub fn new() -> Self {
        Self { current: RwLock::new(Arc::new(Snapshot::empty())), state: Mutex::new(CorpusState::Empty) }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let corpus = Self::new();
        corpus.publish(snapshot);
        corpus
    }

    pub fn state(&self) -> CorpusState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn next_version(&self) -> u64 {
        self.snapshot().version() + 1
    }

    /// Marks the corpus as ingesting and returns the state to restore if the
    /// ingestion is abandoned.
    pub(crate) fn begin_ingest(&self) -> CorpusState {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let previous = *state;
        *state = CorpusState::Ingesting;
        previous
    }

    pub(crate) fn abort_ingest(&self, previous: CorpusState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = previous;
    }

    pub fn publish(&self, snapshot: Snapshot) {
        let version = snapshot.version();
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(snapshot);
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = CorpusState::Ready;
        tracing::info!("Published corpus snapshot v{}", version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdb_core::types::IndexEntry;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk { id: id.into(), source_document_id: "d".into(), chunk_index: 0, start_offset: 0, end_offset: text.chars().count(), text: text.into() }
    }

    #[test]
    fn new_corpus_is_empty() {
        let corpus = Corpus::new();
        assert_eq!(corpus.state(), CorpusState::Empty);
        assert!(corpus.snapshot().is_empty());
        assert_eq!(corpus.next_version(), 1);
    }

    #[test]
    fn publish_swaps_without_touching_held_snapshots() {
        let corpus = Corpus::new();
        let held = corpus.snapshot();
        let mut index = FlatIndex::new();
        index.insert(vec![IndexEntry::new("d:0", vec![1.0, 0.0])]).expect("insert");
        corpus.publish(Snapshot::new(1, Box::new(index), vec![chunk("d:0", "abc")], IngestReport::default()));

        assert_eq!(corpus.state(), CorpusState::Ready);
        assert_eq!(corpus.snapshot().len(), 1);
        assert!(held.is_empty(), "old readers keep their version");
    }

    #[test]
    fn save_detects_dangling_entries() {
        let mut index = FlatIndex::new();
        index.insert(vec![IndexEntry::new("ghost", vec![1.0])]).expect("insert");
        let snapshot = Snapshot::new(1, Box::new(index), Vec::new(), IngestReport::default());
        let tmp = tempfile::tempdir().expect("tmp");
        assert!(matches!(snapshot.save(&tmp.path().join("i.jsonl")), Err(Error::IndexConsistency(id)) if id == "ghost"));
    }
}
