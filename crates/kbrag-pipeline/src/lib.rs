//! Linear retrieval pipeline: chunk -> embed -> rank -> assemble.
//!
//! The pipeline owns nothing mutable across calls. `build_index`
//! rebuilds the whole index from the documents every time (chunks and
//! vectors are never patched in place), and `retrieve` is a pure
//! function of the index and the query.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use kbrag_chunk::{chunk_all, ChunkConfig};
use kbrag_core::error::Error;
use kbrag_core::traits::{Embedder, Generator};
use kbrag_core::types::{Document, IndexEntry, ScoredResult};
use kbrag_retrieve::{assemble_context, hybrid_rank};

/// Every knob the pipeline takes, passed in explicitly at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub top_k: usize,
    pub max_context_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { chunk_size: 800, overlap: 80, top_k: 3, max_context_chars: 2000 }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> kbrag_core::error::Result<()> {
        self.chunking().validate()?;
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be positive".to_string()));
        }
        Ok(())
    }

    fn chunking(&self) -> ChunkConfig {
        ChunkConfig { chunk_size: self.chunk_size, overlap: self.overlap }
    }
}

/// The flat-file index artifact: chunks with their attached vectors.
#[derive(Debug, Serialize, Deserialize)]
pub struct RagIndex {
    pub embedding_dim: usize,
    pub entries: Vec<IndexEntry>,
}

impl RagIndex {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec(self)?)?;
        info!(artifact = %path.display(), entries = self.entries.len(), "saved index");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound(path.display().to_string()).into());
        }
        let raw = fs::read_to_string(path)?;
        let index: Self = serde_json::from_str(&raw)?;
        info!(artifact = %path.display(), entries = index.entries.len(), "loaded index");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a query produces: the assembled context plus the ranked results
/// it was built from. Generation is downstream of this pair.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub context: String,
    pub results: Vec<ScoredResult>,
}

pub struct RagPipeline {
    config: PipelineConfig,
    embedder: Box<dyn Embedder>,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    pub fn new(config: PipelineConfig, embedder: Box<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, embedder })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Chunk every document and embed all chunk contents in one batch,
    /// attaching vectors 1:1. Always a full rebuild.
    pub fn build_index(&self, docs: &[Document]) -> Result<RagIndex> {
        let chunks = chunk_all(docs, &self.config.chunking())?;
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        debug_assert_eq!(embeddings.len(), chunks.len());
        for e in &embeddings {
            debug_assert_eq!(e.len(), self.embedder.dim());
        }
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, vector)| IndexEntry { chunk, vector: Some(vector) })
            .collect::<Vec<_>>();
        info!(documents = docs.len(), entries = entries.len(), "built index");
        Ok(RagIndex { embedding_dim: self.embedder.dim(), entries })
    }

    /// Embed the query, rank the top-k entries (dense cosine merged with
    /// exact-term matching) and assemble the context within the
    /// configured character budget.
    pub fn retrieve(&self, index: &RagIndex, query: &str) -> Result<Retrieval> {
        let query_vec = self.embedder.embed_batch(&[query.to_string()])?.remove(0);
        let results = hybrid_rank(query, &query_vec, &index.entries, self.config.top_k)?;
        let context = assemble_context(&results, self.config.max_context_chars);
        debug!(query, hits = results.len(), context_chars = context.chars().count(), "retrieved");
        Ok(Retrieval { context, results })
    }

    /// Retrieve, then hand the query and context to the injected
    /// generator.
    pub fn answer_with(
        &self,
        generator: &dyn Generator,
        index: &RagIndex,
        query: &str,
    ) -> Result<String> {
        let retrieval = self.retrieve(index, query)?;
        generator.generate(query, &retrieval.context)
    }
}

/// Offline generator: renders the retrieval prompt instead of calling a
/// model, so the pipeline output stays inspectable end to end.
#[derive(Debug, Default)]
pub struct PromptGenerator;

impl Generator for PromptGenerator {
    fn generate(&self, query: &str, context: &str) -> Result<String> {
        Ok(format!(
            "Based on the following context:\n{context}\n\nQuestion: {query}\n\nAnswer:"
        ))
    }
}
