//! Corpus loaders: plain-text files under a directory and Q&A JSON records.
//!
//! Both produce [`Document`]s only; chunking happens later so loaders stay
//! independent of chunk parameters.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::Document;

#[derive(Debug, Deserialize)]
struct QaFile {
    qa_data: Vec<QaRecord>,
}

#[derive(Debug, Deserialize)]
struct QaRecord {
    question: String,
    answer: String,
}

#[derive(Default)]
pub struct DataProcessor {
    limit: Option<usize>,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    /// Only load the first `limit` files (in path order).
    pub fn with_limit(limit: usize) -> Self { Self { limit: Some(limit) } }

    pub fn load_directory(&self, data_dir: &Path) -> Result<Vec<Document>> {
        let mut files = self.list_txt_files(data_dir);
        if files.is_empty() {
            tracing::warn!("No .txt files found under {}", data_dir.display());
            return Ok(vec![]);
        }
        if let Some(limit) = self.limit {
            if files.len() > limit {
                files.truncate(limit);
                tracing::info!("Limited to first {} files", limit);
            }
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!("Reading file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let text = self.read_file_content(file_path)?;
            let id = self.doc_id_for(file_path, data_dir);
            documents.push(Document::new(id, text).with_source(file_path.to_string_lossy()));
        }
        tracing::info!("Loaded {} documents from {}", documents.len(), data_dir.display());
        Ok(documents)
    }

    /// Each question and each answer becomes its own document.
    pub fn load_qa_json(&self, path: &Path) -> Result<Vec<Document>> {
        let file: QaFile = serde_json::from_str(&fs::read_to_string(path)?)?;
        let records = match self.limit {
            Some(limit) => &file.qa_data[..file.qa_data.len().min(limit)],
            None => &file.qa_data[..],
        };
        let mut documents = Vec::with_capacity(records.len() * 2);
        for (i, record) in records.iter().enumerate() {
            let source = path.to_string_lossy();
            documents.push(Document::new(format!("qa-{i}-question"), record.question.clone()).with_source(format!("{source}#{i}/question")));
            documents.push(Document::new(format!("qa-{i}-answer"), record.answer.clone()).with_source(format!("{source}#{i}/answer")));
        }
        tracing::info!("Loaded {} Q&A pairs from {}", records.len(), path.display());
        Ok(documents)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    /// Path relative to the root, without extension, `/`-separated. File stems
    /// alone collide across subdirectories.
    fn doc_id_for(&self, file_path: &Path, data_dir: &Path) -> String {
        let relative = file_path.strip_prefix(data_dir).unwrap_or(file_path).with_extension("");
        relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path(); if path.extension().and_then(|s| s.to_str()) == Some("txt") { txt_files.push(path.to_path_buf()); }
        }
        txt_files.sort(); txt_files
    }
}
