use std::env;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use kbrag_chunk::{chunk_all, ChunkConfig};
use kbrag_core::config::{expand_path, Config};
use kbrag_core::store::DocumentStore;
use kbrag_core::traits::Embedder as _;
use kbrag_core::types::IndexEntry;
use kbrag_embed::{get_default_embedder, DEFAULT_DIM};
use kbrag_pipeline::{PipelineConfig, PromptGenerator, RagIndex, RagPipeline};

const EMBED_BATCH: usize = 64;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|query> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            let corpus = args.first().map(PathBuf::from).unwrap_or_else(|| {
                let p: String = config
                    .get("data.corpus_path")
                    .unwrap_or_else(|_| "data/corpus.json".to_string());
                expand_path(p)
            });
            println!("Ingesting from {}", corpus.display());

            let mut store = DocumentStore::new();
            let added = if corpus.is_dir() {
                store.load_dir(&corpus)?
            } else {
                store.load_json(&corpus)?
            };
            println!("Loaded {} documents", added);

            let pipeline_cfg: PipelineConfig =
                config.get("pipeline").unwrap_or_else(|_| PipelineConfig::default());
            pipeline_cfg.validate()?;
            let chunk_cfg = ChunkConfig {
                chunk_size: pipeline_cfg.chunk_size,
                overlap: pipeline_cfg.overlap,
            };
            let chunks = chunk_all(store.documents(), &chunk_cfg)?;
            println!("Chunked into {} chunks", chunks.len());

            let dim: usize = config.get("embedding.dim").unwrap_or(DEFAULT_DIM);
            let embedder = get_default_embedder(dim)?;
            let pb = ProgressBar::new(chunks.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                    .expect("progress template")
                    .progress_chars("#>-"),
            );
            let mut entries: Vec<IndexEntry> = Vec::with_capacity(chunks.len());
            for batch in chunks.chunks(EMBED_BATCH) {
                let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
                let embeddings = embedder.embed_batch(&texts)?;
                for (chunk, vector) in batch.iter().cloned().zip(embeddings) {
                    entries.push(IndexEntry { chunk, vector: Some(vector) });
                }
                pb.inc(batch.len() as u64);
            }
            pb.finish_with_message("embedding complete");

            let artifact = expand_path(
                config
                    .get::<String>("data.index_path")
                    .unwrap_or_else(|_| "data/index.json".to_string()),
            );
            let index = RagIndex { embedding_dim: dim, entries };
            index.save(&artifact)?;
            println!("✅ Ingest complete ({} chunks) -> {}", index.len(), artifact.display());
        }
        "query" => {
            let mut render_prompt = false;
            let mut query_text: Option<String> = None;
            for arg in &args {
                match arg.as_str() {
                    "--prompt" | "-p" => render_prompt = true,
                    _ => query_text = Some(arg.clone()),
                }
            }
            let query_text = query_text.unwrap_or_else(|| {
                eprintln!("Usage: kbrag query [--prompt] \"<query>\"");
                std::process::exit(1)
            });

            let artifact = expand_path(
                config
                    .get::<String>("data.index_path")
                    .unwrap_or_else(|_| "data/index.json".to_string()),
            );
            let index = RagIndex::load(&artifact)?;
            let pipeline_cfg: PipelineConfig =
                config.get("pipeline").unwrap_or_else(|_| PipelineConfig::default());
            let embedder = get_default_embedder(index.embedding_dim)?;
            let pipeline = RagPipeline::new(pipeline_cfg, embedder)?;
            let retrieval = pipeline.retrieve(&index, &query_text)?;

            println!("\nTop matches:");
            for result in &retrieval.results {
                let preview: String = result
                    .chunk
                    .content
                    .chars()
                    .take(160)
                    .collect::<String>()
                    .replace('\n', " ");
                println!("- {} (score={:.3})", result.chunk.id, result.score);
                println!("  {}...", preview);
            }
            if render_prompt {
                let prompt = pipeline.answer_with(&PromptGenerator, &index, &query_text)?;
                println!("\n{}", prompt);
            } else {
                println!("\nContext:\n{}", retrieval.context);
            }
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
