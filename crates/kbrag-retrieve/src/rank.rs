//! Ranking over in-memory index entries.
//!
//! Two scoring paths: dense cosine similarity over attached vectors, and
//! a term-match scorer over chunk contents so exact tokens like error
//! codes stay retrievable even when embeddings don't favor them.
//! `hybrid_rank` merges both by chunk id, keeping the better score.

use std::collections::HashMap;

use tracing::debug;

use kbrag_core::error::{Error, Result};
use kbrag_core::types::{IndexEntry, ScoredResult};

const EPSILON: f32 = 1e-8;

/// Cosine similarity between two vectors: dot / (|a|·|b|).
///
/// A zero-magnitude vector on either side scores 0.0 instead of dividing
/// by zero. Mismatched lengths are scored over the common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= EPSILON || norm_b <= EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score every embedded entry against the query vector and keep the top
/// `top_k`, highest first.
///
/// - Entries without an attached vector are skipped silently.
/// - No embedded entries at all is `Error::EmptyIndex`.
/// - Ties keep original entry order (stable sort).
/// - `top_k` larger than the candidate count returns all candidates.
pub fn rank(query: &[f32], entries: &[IndexEntry], top_k: usize) -> Result<Vec<ScoredResult>> {
    let mut results: Vec<ScoredResult> = entries
        .iter()
        .filter_map(|entry| {
            entry.vector.as_ref().map(|v| ScoredResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, v),
            })
        })
        .collect();

    if results.is_empty() {
        return Err(Error::EmptyIndex);
    }

    // sort_by is stable, so equal scores preserve insertion order.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);
    debug!(candidates = entries.len(), returned = results.len(), "ranked query");
    Ok(results)
}

/// Score entries by the fraction of query terms appearing in the chunk
/// content (case-insensitive substring match), keep the top `top_k`.
///
/// Runs over every entry, embedded or not; entries matching no term are
/// excluded rather than scored zero. Never fails: no matches is just an
/// empty result.
pub fn keyword_rank(query: &str, entries: &[IndexEntry], top_k: usize) -> Vec<ScoredResult> {
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower.split_whitespace().collect();
    if terms.is_empty() {
        return Vec::new();
    }
    let mut results: Vec<ScoredResult> = entries
        .iter()
        .filter_map(|entry| {
            let content_lower = entry.chunk.content.to_lowercase();
            let matched = terms.iter().filter(|t| content_lower.contains(*t)).count();
            if matched == 0 {
                None
            } else {
                Some(ScoredResult {
                    chunk: entry.chunk.clone(),
                    score: matched as f32 / terms.len() as f32,
                })
            }
        })
        .collect();
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);
    results
}

/// Dense and keyword paths merged: rank by cosine similarity, rank by
/// term match, merge unique chunk ids keeping the better score, re-sort
/// descending (stable on original entry order) and truncate to `top_k`.
///
/// The dense path's contract carries over: zero embedded entries is
/// `Error::EmptyIndex` regardless of keyword matches.
pub fn hybrid_rank(
    query: &str,
    query_vec: &[f32],
    entries: &[IndexEntry],
    top_k: usize,
) -> Result<Vec<ScoredResult>> {
    let dense_hits = rank(query_vec, entries, top_k)?;
    let keyword_hits = keyword_rank(query, entries, top_k);

    let mut by_id: HashMap<&str, f32> = HashMap::new();
    for hit in dense_hits.iter().chain(keyword_hits.iter()) {
        by_id
            .entry(hit.chunk.id.as_str())
            .and_modify(|score| {
                if hit.score > *score {
                    *score = hit.score;
                }
            })
            .or_insert(hit.score);
    }

    // Collect in original entry order so the stable sort keeps the
    // tie-break deterministic.
    let mut merged: Vec<ScoredResult> = entries
        .iter()
        .filter_map(|entry| {
            by_id.get(entry.chunk.id.as_str()).map(|&score| ScoredResult {
                chunk: entry.chunk.clone(),
                score,
            })
        })
        .collect();
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(top_k);
    debug!(query, returned = merged.len(), "hybrid ranked query");
    Ok(merged)
}
