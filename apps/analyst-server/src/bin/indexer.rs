use std::env;

use anyhow::Context as _;
use analyst_core::chunker::Chunker;
use analyst_core::config::Config;
use analyst_core::loader::load_document;
use analyst_core::traits::VectorStore;
use analyst_embed::get_default_embedder;
use analyst_server::init_tracing;
use analyst_vector::{index_document, LanceVectorStore};

fn usage(prog: &str) -> ! {
    eprintln!("Usage: {prog} [--clear] [--stats] [document]");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;

    let mut args = env::args();
    let prog = args.next().unwrap_or_else(|| "analyst-indexer".to_string());
    let (mut clear, mut stats_only, mut doc_arg) = (false, false, None);
    for arg in args {
        match arg.as_str() {
            "--clear" | "-c" => clear = true,
            "--stats" | "-s" => stats_only = true,
            "--help" | "-h" => usage(&prog),
            a if !a.starts_with('-') => doc_arg = Some(a.to_string()),
            _ => usage(&prog),
        }
    }

    let embedder = get_default_embedder(&settings.gemini)?;
    let store_dir = config.resolve(&settings.vector_store.path);
    let store = LanceVectorStore::open(&store_dir, &settings.vector_store.collection, embedder.dim())
        .await
        .with_context(|| format!("opening vector store at {}", store_dir.display()))?;
    let chunker = Chunker::from_settings(&settings.chunking)?;
    let doc_path = config.resolve(doc_arg.as_deref().unwrap_or(&settings.document.path));

    println!("Market Analyst Indexer\n======================");
    println!("Config dir:   {}", config.base_dir().display());
    println!("Document:     {}", doc_path.display());
    println!("Vector store: {} ({}, dim {})", store_dir.display(), settings.vector_store.collection, store.dim());
    println!("Chunking:     {} chars, {} overlap", chunker.chunk_size(), chunker.overlap());

    if stats_only {
        let stats = store.collection_stats().await?;
        println!("\nCollection '{}': {} chunks in {}", stats.name, stats.total_documents, stats.persist_directory);
        let text = load_document(&doc_path)?;
        let chunk_stats = chunker.statistics(&chunker.chunk(&text));
        println!(
            "Document would produce {} chunks (avg {:.1}, min {}, max {} chars; {} total; overlap ratio {:.2})",
            chunk_stats.total_chunks,
            chunk_stats.avg_chunk_size,
            chunk_stats.min_chunk_size,
            chunk_stats.max_chunk_size,
            chunk_stats.total_characters,
            chunk_stats.overlap_ratio
        );
        return Ok(());
    }

    if clear {
        store.clear_collection().await?;
        println!("Cleared collection '{}'", settings.vector_store.collection);
    }

    let text = load_document(&doc_path).with_context(|| format!("loading {}", doc_path.display()))?;
    let report = index_document(&text, &chunker, &embedder, &store).await?;
    let total = store.collection_stats().await?.total_documents;
    println!("\nIndexed {} chunks (collection now holds {})", report.chunks, total);
    println!("Average chunk size: {:.1} chars", report.statistics.avg_chunk_size);
    Ok(())
}
