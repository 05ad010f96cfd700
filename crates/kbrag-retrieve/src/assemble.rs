//! Context assembly: top-ranked chunks into one bounded string.

use std::collections::HashSet;

use kbrag_core::types::ScoredResult;

/// Fixed joiner between included chunks, so boundaries stay locatable in
/// the composed context.
pub const SEPARATOR: &str = "\n---\n";

/// Concatenate chunk contents in the given (descending-score) order into
/// a single context string of at most `max_chars` characters.
///
/// The last included chunk is truncated on a char boundary to fit;
/// separators count against the budget; a chunk id is never included
/// twice. Zero results or a zero budget produce `""`.
pub fn assemble_context(results: &[ScoredResult], max_chars: usize) -> String {
    let sep_chars = SEPARATOR.chars().count();
    let mut out = String::new();
    let mut used = 0usize;
    let mut seen: HashSet<&str> = HashSet::new();

    for result in results {
        if !seen.insert(result.chunk.id.as_str()) {
            continue;
        }
        let mut remaining = max_chars - used;
        if !out.is_empty() {
            // A further chunk only fits if the separator does too.
            if remaining <= sep_chars {
                break;
            }
            remaining -= sep_chars;
        }
        if remaining == 0 {
            break;
        }
        let piece: String = result.chunk.content.chars().take(remaining).collect();
        if piece.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str(SEPARATOR);
            used += sep_chars;
        }
        used += piece.chars().count();
        out.push_str(&piece);
        if used >= max_chars {
            break;
        }
    }
    out
}
