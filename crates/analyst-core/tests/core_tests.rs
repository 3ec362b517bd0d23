use std::fs;

use analyst_core::chunker::Chunker;
use analyst_core::config::{resolve_with_base, Config};
use analyst_core::loader::load_document;
use analyst_core::Error;
use tempfile::TempDir;

#[test]
fn load_document_reads_text_files() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("report.txt");
    fs::write(&path, "Innovate Inc. market research report\n\nQ3 2025").unwrap();

    let text = load_document(&path).expect("load");
    assert!(text.starts_with("Innovate Inc."));
    assert!(text.ends_with("Q3 2025"));
}

#[test]
fn load_document_accepts_markdown_and_uppercase_extensions() {
    let tmp = TempDir::new().unwrap();
    let md = tmp.path().join("notes.md");
    let upper = tmp.path().join("NOTES.TXT");
    fs::write(&md, "# Heading").unwrap();
    fs::write(&upper, "shouting").unwrap();

    assert_eq!(load_document(&md).unwrap(), "# Heading");
    assert_eq!(load_document(&upper).unwrap(), "shouting");
}

#[test]
fn load_document_missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = load_document(&tmp.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[test]
fn load_document_rejects_pdf_and_other_formats() {
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("report.pdf");
    let docx = tmp.path().join("report.docx");
    fs::write(&pdf, b"%PDF-1.7").unwrap();
    fs::write(&docx, b"PK").unwrap();

    assert!(matches!(load_document(&pdf), Err(Error::UnsupportedFormat(_))));
    assert!(matches!(load_document(&docx), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn load_document_falls_back_to_latin1() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("legacy.txt");
    fs::write(&path, [b'N', b'a', b'r', 0xEF, b'v', b'e']).unwrap();

    assert_eq!(load_document(&path).unwrap(), "Narïve");
}

#[test]
fn loaded_document_chunks_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("report.txt");
    let paragraph = "Innovate Inc. leads the workflow automation segment with steady growth. ";
    fs::write(&path, paragraph.repeat(40)).unwrap();

    let text = load_document(&path).unwrap();
    let chunker = Chunker::new(300, 60).unwrap();
    let chunks = chunker.chunk(&text);
    assert!(chunks.len() > 1);
    for c in &chunks {
        assert!(c.length <= 300);
    }
    let stats = chunker.statistics(&chunks);
    assert_eq!(stats.total_chunks, chunks.len());
}

#[test]
fn config_reads_toml_over_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        r#"
[chunking]
chunk_size = 500
chunk_overlap = 50

[server]
port = 9100

[vector_store]
path = "store/lancedb"
"#,
    )
    .unwrap();

    let config = Config::load_in(tmp.path()).expect("config");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.chunking.chunk_size, 500);
    assert_eq!(settings.chunking.chunk_overlap, 50);
    assert_eq!(settings.server.port, 9100);
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.vector_store.collection, "market_research");
    assert_eq!(settings.gemini.embedding_model, "models/text-embedding-004");

    let port: u16 = config.get("server.port").unwrap();
    assert_eq!(port, 9100);
    assert_eq!(config.base_dir(), tmp.path());
    assert_eq!(config.resolve(&settings.vector_store.path), tmp.path().join("store/lancedb"));

    let chunker = Chunker::from_settings(&settings.chunking).expect("chunker");
    assert_eq!((chunker.chunk_size(), chunker.overlap()), (500, 50));
}

#[test]
fn config_rejects_overlap_not_below_chunk_size() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();

    let err = Config::load_in(tmp.path()).err().expect("invalid config");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn resolve_with_base_keeps_absolute_paths() {
    let tmp = TempDir::new().unwrap();
    let abs = tmp.path().join("abs.txt");
    assert_eq!(resolve_with_base(tmp.path(), abs.to_string_lossy()), abs);
    assert_eq!(resolve_with_base(tmp.path(), "rel.txt"), tmp.path().join("rel.txt"));
}
