//! Document store: owns the loaded corpus.
//!
//! Two loaders cover the corpus formats we ingest: a flat JSON array of
//! `{content, metadata}` objects, and a directory tree of `.txt` files.
//! Documents are immutable once loaded; rebuilding an index always starts
//! from the store, never from previously derived chunks.

use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Error;
use crate::types::{Document, Meta};

#[derive(Debug, Deserialize)]
struct RawDocument {
    content: String,
    #[serde(default)]
    metadata: Meta,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a flat JSON array of `{content, metadata}` objects.
    ///
    /// `doc_id` comes from `metadata["id"]` when present, otherwise the
    /// position in the file. Returns the number of documents added.
    pub fn load_json(&mut self, path: &Path) -> Result<usize> {
        if !path.is_file() {
            return Err(Error::NotFound(path.display().to_string()).into());
        }
        let raw = fs::read_to_string(path)?;
        let items: Vec<RawDocument> = serde_json::from_str(&raw)?;
        let offset = self.documents.len();
        for (i, item) in items.into_iter().enumerate() {
            let doc_id = item
                .metadata
                .get("id")
                .cloned()
                .unwrap_or_else(|| format!("doc-{}", offset + i));
            self.documents.push(Document {
                doc_id,
                content: item.content,
                metadata: item.metadata,
            });
        }
        let added = self.documents.len() - offset;
        info!(corpus = %path.display(), added, "loaded JSON corpus");
        Ok(added)
    }

    /// Load every `.txt` file under `root` (sorted), one document per
    /// file. `doc_id` is the file stem; the relative path is recorded in
    /// the metadata under `"path"`.
    pub fn load_dir(&mut self, root: &Path) -> Result<usize> {
        if !root.is_dir() {
            return Err(Error::NotFound(root.display().to_string()).into());
        }
        let files = list_txt_files(root);
        if files.is_empty() {
            info!(dir = %root.display(), "no .txt files found");
            return Ok(0);
        }
        let offset = self.documents.len();
        for file_path in &files {
            let content = read_file_content(file_path)?;
            let doc_id = file_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| file_path.display().to_string());
            let mut metadata = Meta::new();
            let relative = file_path.strip_prefix(root).unwrap_or(file_path);
            metadata.insert("path".to_string(), relative.display().to_string());
            debug!(doc_id, chars = content.chars().count(), "loaded document");
            self.documents.push(Document { doc_id, content, metadata });
        }
        let added = self.documents.len() - offset;
        info!(dir = %root.display(), added, "loaded directory corpus");
        Ok(added)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("txt") {
            txt_files.push(path.to_path_buf());
        }
    }
    txt_files.sort();
    txt_files
}
