//! Offline embedding backend.
//!
//! `HashEmbedder` projects each whitespace token into a fixed-dimension
//! vector through xxHash and L2-normalizes the sum. It is deterministic
//! and needs no model files, which makes it the default collaborator for
//! local runs and tests; a real model or remote API plugs in behind the
//! same `Embedder` trait.

use anyhow::{anyhow, Result};
use tracing::debug;

use kbrag_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 384;

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(anyhow!("embedding dimension must be positive"));
        }
        Ok(Self { dim })
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: DEFAULT_DIM }
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(count = texts.len(), dim = self.dim, "embedding batch");
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn get_default_embedder(dim: usize) -> Result<Box<dyn Embedder>> {
    Ok(Box::new(HashEmbedder::new(dim)?))
}
