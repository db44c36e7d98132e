//! JSON Lines persistence for index snapshots.
//!
//! One record per index entry, in insertion order. Re-inserting the records in
//! file order reproduces the original `search` results because normalization
//! leaves unit vectors untouched.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ragdb_core::error::{Error, Result};
use ragdb_core::types::{Chunk, ChunkId, IndexEntry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub chunk_id: ChunkId,
    pub vector: Vec<f32>,
    pub source_document_id: String,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(default)]
    pub chunk_index: usize,
    #[serde(default)]
    pub text: String,
}

impl PersistedRecord {
    pub fn from_parts(entry: &IndexEntry, chunk: &Chunk) -> Self {
        Self {
            chunk_id: entry.chunk_id.clone(),
            vector: entry.vector.clone(),
            source_document_id: chunk.source_document_id.clone(),
            start_offset: chunk.start_offset,
            end_offset: chunk.end_offset,
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
        }
    }

    pub fn into_parts(self) -> (IndexEntry, Chunk) {
        let chunk = Chunk {
            id: self.chunk_id.clone(),
            source_document_id: self.source_document_id,
            chunk_index: self.chunk_index,
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            text: self.text,
        };
        (IndexEntry { chunk_id: self.chunk_id, vector: self.vector }, chunk)
    }
}

pub fn write_records<'a, I>(path: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a PersistedRecord>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    let mut written = 0usize;
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    tracing::info!("Wrote {} index records to {}", written, path.display());
    Ok(written)
}

pub fn read_records(path: &Path) -> Result<Vec<PersistedRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: PersistedRecord = serde_json::from_str(&line).map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{}:{}: invalid index record: {e}", path.display(), line_no + 1),
            ))
        })?;
        records.push(record);
    }
    Ok(records)
}
