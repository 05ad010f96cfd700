pub mod assemble;
pub mod rank;

pub use assemble::{assemble_context, SEPARATOR};
pub use rank::{cosine_similarity, hybrid_rank, keyword_rank, rank};
