//! Domain types shared by the chunker, the vector index and the query engine.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;
pub type DocumentId = String;
pub type EmbeddingVector = Vec<f32>;

/// A source document handed over by a text extraction collaborator.
///
/// - `id`: stable document identity (relative path, Q&A record id)
/// - `text`: the plain text payload
/// - `source`: optional human-readable origin (file path, record locator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), source: None }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A bounded contiguous span of a document.
///
/// Offsets count chars (not bytes) and are half-open: `text` is exactly the
/// chars `[start_offset, end_offset)` of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source_document_id: DocumentId,
    pub chunk_index: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub text: String,
}

impl Chunk {
    pub fn make_id(document_id: &str, chunk_index: usize) -> ChunkId {
        format!("{document_id}:{chunk_index}")
    }

    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk_id: ChunkId,
    pub vector: EmbeddingVector,
}

impl IndexEntry {
    pub fn new(chunk_id: impl Into<ChunkId>, vector: EmbeddingVector) -> Self {
        Self { chunk_id: chunk_id.into(), vector }
    }
}

/// A raw hit from a vector index. `distance` is lower-is-better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: ChunkId,
    pub distance: f32,
}

/// A hit resolved back to its chunk. `rank` is 0-based; `score` is the
/// Euclidean distance between unit vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    pub score: f32,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub provenance: RetrievalResult,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorpusState {
    Empty,
    Ingesting,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStage {
    Received,
    Embedded,
    Retrieved,
    Answered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedChunk {
    pub chunk_id: ChunkId,
    pub reason: String,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub indexed: usize,
    pub skipped: Vec<SkippedChunk>,
}
