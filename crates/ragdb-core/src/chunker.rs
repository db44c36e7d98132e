//! Fixed-window chunking with overlap.
//!
//! Windows are measured in chars so that every chunk is a valid `&str` slice
//! of its document regardless of the UTF-8 width of its contents.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_length: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(max_length: usize, overlap: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(Error::Config("max_length must be positive".into()));
        }
        if overlap >= max_length {
            return Err(Error::Config(format!(
                "overlap ({overlap}) must be smaller than max_length ({max_length})"
            )));
        }
        Ok(Self { max_length, overlap })
    }

    pub fn max_length(&self) -> usize { self.max_length }
    pub fn overlap(&self) -> usize { self.overlap }

    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = document.text.as_str();
        // Byte offset of every char boundary, including the end of the text.
        let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let len = bounds.len() - 1;
        if len == 0 {
            return Vec::new();
        }

        let step = self.max_length - self.overlap;
        let mut chunks = Vec::with_capacity(len.div_ceil(step));
        let mut start = 0usize;
        loop {
            let end = (start + self.max_length).min(len);
            let chunk_index = chunks.len();
            chunks.push(Chunk {
                id: Chunk::make_id(&document.id, chunk_index),
                source_document_id: document.id.clone(),
                chunk_index,
                start_offset: start,
                end_offset: end,
                text: text[bounds[start]..bounds[end]].to_string(),
            });
            if end >= len {
                break;
            }
            start += step;
        }
        chunks
    }

    /// Chunks documents in parallel; output keeps document order.
    pub fn chunk_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.par_iter().map(|d| self.chunk(d)).collect::<Vec<_>>().into_iter().flatten().collect()
    }
}

/// Convenience wrapper around [`Chunker`] for one-off calls.
pub fn chunk(document: &Document, max_length: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(Chunker::new(max_length, overlap)?.chunk(document))
}
