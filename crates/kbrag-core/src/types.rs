//! Domain types shared by the chunking, embedding and retrieval stages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;
pub type EmbeddingVector = Vec<f32>;

/// A source document as loaded into the store.
///
/// Immutable once loaded: nothing downstream writes back into a document.
/// Chunks are always recomputed from the document, never patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Meta,
}

/// A bounded slice of a document's text used as the retrieval unit.
///
/// - `id`: `"{doc_id}:{chunk_index}"`, unique within an index
/// - `metadata`: copied from the parent document
/// - `chunk_index`/`total_chunks`: position within the parent document
/// - `char_offset`: character position of the chunk start in the parent
///
/// Concatenating a document's chunks in order reconstructs the content
/// with no interior gap; consecutive chunks overlap by the configured
/// window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub content: String,
    pub metadata: Meta,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub char_offset: usize,
}

/// A chunk plus its attached embedding, as stored in the index.
///
/// `vector` is `None` until an embedder has run over the chunk. Entries
/// without a vector never participate in ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub vector: Option<EmbeddingVector>,
}

/// A ranked retrieval hit.
///
/// `score` is cosine similarity against the query vector, roughly in
/// `[-1, 1]`; higher is better. Result order is descending score with
/// original entry order preserved on ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}
