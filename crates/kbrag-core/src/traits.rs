//! Capability seams for the external collaborators.
//!
//! The pipeline only ever consumes these traits; concrete backends (a
//! local hash embedder, a remote API, a mock in tests) plug in behind
//! them without the core knowing the difference.

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

pub trait Generator: Send + Sync {
    fn generate(&self, query: &str, context: &str) -> anyhow::Result<String>;
}
