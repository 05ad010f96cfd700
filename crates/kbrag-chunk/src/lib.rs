//! Sliding-window chunker.
//!
//! Splits a document into character windows of at most `chunk_size`,
//! where consecutive windows share `overlap` characters across the
//! boundary. Window i starts at `i * (chunk_size - overlap)`, so no
//! interior character range is ever skipped and concatenating a
//! document's chunks in order reconstructs the full content.

use tracing::debug;

use kbrag_core::error::{Error, Result};
use kbrag_core::types::{Document, DocumentChunk};

#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks; must stay below
    /// `chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { chunk_size: 800, overlap: 80 }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Chunk a single document. Pure: the document is read, never touched.
///
/// A document of at most `chunk_size` characters comes back as exactly
/// one chunk with content and metadata unchanged.
pub fn chunk_document(doc: &Document, cfg: &ChunkConfig) -> Result<Vec<DocumentChunk>> {
    cfg.validate()?;

    // Byte offset of every char start, so windows slice on char
    // boundaries regardless of multibyte content.
    let offsets: Vec<usize> = doc.content.char_indices().map(|(b, _)| b).collect();
    let n_chars = offsets.len();
    let byte_at = |char_idx: usize| -> usize {
        if char_idx >= n_chars {
            doc.content.len()
        } else {
            offsets[char_idx]
        }
    };

    let mut pieces: Vec<(usize, String)> = Vec::new();
    if n_chars <= cfg.chunk_size {
        pieces.push((0, doc.content.clone()));
    } else {
        let stride = cfg.chunk_size - cfg.overlap;
        let mut start = 0usize;
        loop {
            let end = (start + cfg.chunk_size).min(n_chars);
            pieces.push((start, doc.content[byte_at(start)..byte_at(end)].to_string()));
            if end >= n_chars {
                break;
            }
            start += stride;
        }
    }

    let total_chunks = pieces.len();
    let chunks = pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_index, (char_offset, content))| DocumentChunk {
            id: format!("{}:{}", doc.doc_id, chunk_index),
            doc_id: doc.doc_id.clone(),
            content,
            metadata: doc.metadata.clone(),
            chunk_index,
            total_chunks,
            char_offset,
        })
        .collect();
    debug!(doc_id = %doc.doc_id, total_chunks, "chunked document");
    Ok(chunks)
}

/// Chunk every document in order, flattening into one chunk stream.
pub fn chunk_all(docs: &[Document], cfg: &ChunkConfig) -> Result<Vec<DocumentChunk>> {
    cfg.validate()?;
    let mut all_chunks = Vec::new();
    for doc in docs {
        all_chunks.extend(chunk_document(doc, cfg)?);
    }
    Ok(all_chunks)
}
