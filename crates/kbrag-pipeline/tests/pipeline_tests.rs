use tempfile::TempDir;

use kbrag_core::error::Error;
use kbrag_core::traits::Generator;
use kbrag_core::types::{Document, Meta};
use kbrag_embed::get_default_embedder;
use kbrag_pipeline::{PipelineConfig, PromptGenerator, RagIndex, RagPipeline};

fn doc(id: &str, content: &str) -> Document {
    Document { doc_id: id.to_string(), content: content.to_string(), metadata: Meta::new() }
}

fn pipeline(config: PipelineConfig) -> RagPipeline {
    let embedder = get_default_embedder(64).expect("embedder");
    RagPipeline::new(config, embedder).expect("pipeline")
}

fn support_corpus() -> Vec<Document> {
    vec![
        doc(
            "article-001",
            "To reset your password, go to Settings then Security. You need email \
             verification and the new password must be at least 12 characters.",
        ),
        doc(
            "article-002",
            "Error E-4012 means expired API key. Error E-4013 means rate limit exceeded.",
        ),
        doc(
            "article-003",
            "Our cookbook collects slow braise recipes, stock reductions and a weeknight \
             pasta rotation for busy kitchens.",
        ),
    ]
}

#[test]
fn build_index_attaches_one_vector_per_chunk() {
    let p = pipeline(PipelineConfig::default());
    let index = p.build_index(&support_corpus()).expect("build");
    assert_eq!(index.len(), 3, "short docs produce one chunk each");
    assert_eq!(index.embedding_dim, 64);
    for entry in &index.entries {
        let v = entry.vector.as_ref().expect("vector attached");
        assert_eq!(v.len(), 64);
    }
}

#[test]
fn retrieve_finds_the_matching_article_first() {
    let p = pipeline(PipelineConfig { top_k: 2, ..PipelineConfig::default() });
    let index = p.build_index(&support_corpus()).expect("build");
    let retrieval = p.retrieve(&index, "how do I reset my password").expect("retrieve");

    assert_eq!(retrieval.results.len(), 2);
    assert_eq!(retrieval.results[0].chunk.doc_id, "article-001");
    assert!(retrieval.results[0].score >= retrieval.results[1].score);
    assert!(retrieval.context.contains("reset your password"));
}

#[test]
fn context_respects_the_configured_budget() {
    let config = PipelineConfig { max_context_chars: 40, ..PipelineConfig::default() };
    let p = pipeline(config);
    let index = p.build_index(&support_corpus()).expect("build");
    let retrieval = p.retrieve(&index, "password reset").expect("retrieve");
    assert!(retrieval.context.chars().count() <= 40);
}

#[test]
fn rebuild_is_idempotent() {
    let p = pipeline(PipelineConfig::default());
    let docs = support_corpus();
    let first = p.build_index(&docs).expect("build");
    let second = p.build_index(&docs).expect("rebuild");
    assert_eq!(first.len(), second.len());
    for (a, b) in first.entries.iter().zip(second.entries.iter()) {
        assert_eq!(a.chunk.id, b.chunk.id);
        assert_eq!(a.vector, b.vector);
    }
}

#[test]
fn index_artifact_round_trips_through_a_flat_file() {
    let tmp = TempDir::new().unwrap();
    let artifact = tmp.path().join("index.json");

    let p = pipeline(PipelineConfig::default());
    let index = p.build_index(&support_corpus()).expect("build");
    index.save(&artifact).expect("save");

    let loaded = RagIndex::load(&artifact).expect("load");
    assert_eq!(loaded.len(), index.len());
    assert_eq!(loaded.embedding_dim, index.embedding_dim);

    // Retrieval over the reloaded artifact behaves like the original.
    let retrieval = p.retrieve(&loaded, "expired API key E-4012").expect("retrieve");
    assert_eq!(retrieval.results[0].chunk.doc_id, "article-002");
}

#[test]
fn loading_a_missing_artifact_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = RagIndex::load(&tmp.path().join("absent.json")).expect_err("missing artifact");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::NotFound(_))
    ));
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let embedder = get_default_embedder(16).expect("embedder");
    let bad = PipelineConfig { chunk_size: 10, overlap: 10, ..PipelineConfig::default() };
    let err = RagPipeline::new(bad, embedder).expect_err("bad overlap");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidConfig(_))));

    let embedder = get_default_embedder(16).expect("embedder");
    let bad = PipelineConfig { top_k: 0, ..PipelineConfig::default() };
    let err = RagPipeline::new(bad, embedder).expect_err("zero top_k");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidConfig(_))));
}

#[test]
fn retrieving_from_an_empty_index_fails() {
    let p = pipeline(PipelineConfig::default());
    let index = p.build_index(&[]).expect("build empty");
    assert!(index.is_empty());
    let err = p.retrieve(&index, "anything").expect_err("empty index");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::EmptyIndex)));
}

#[test]
fn long_documents_are_chunked_with_overlap_before_indexing() {
    let config = PipelineConfig { chunk_size: 50, overlap: 10, ..PipelineConfig::default() };
    let p = pipeline(config);
    let long = "password reset instructions ".repeat(20);
    let index = p.build_index(&[doc("long", &long)]).expect("build");
    assert!(index.len() > 1);
    for entry in &index.entries {
        assert!(!entry.chunk.content.is_empty());
        assert!(entry.chunk.content.chars().count() <= 50);
    }
}

#[test]
fn answer_with_renders_the_prompt_around_the_context() {
    let p = pipeline(PipelineConfig::default());
    let index = p.build_index(&support_corpus()).expect("build");
    let answer = p
        .answer_with(&PromptGenerator, &index, "how do I reset my password")
        .expect("answer");
    assert!(answer.starts_with("Based on the following context:"));
    assert!(answer.contains("reset your password"));
    assert!(answer.contains("Question: how do I reset my password"));
}

#[test]
fn a_custom_generator_substitutes_behind_the_trait() {
    struct Echo;
    impl Generator for Echo {
        fn generate(&self, query: &str, _context: &str) -> anyhow::Result<String> {
            Ok(format!("echo: {query}"))
        }
    }
    let p = pipeline(PipelineConfig::default());
    let index = p.build_index(&support_corpus()).expect("build");
    let answer = p.answer_with(&Echo, &index, "ping").expect("answer");
    assert_eq!(answer, "echo: ping");
}
