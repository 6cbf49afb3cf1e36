use std::fs;

use figment::providers::{Format, Toml};
use figment::Figment;
use tempfile::TempDir;

use docqa_core::chunker::{chunk_document, chunk_text, ChunkingConfig};
use docqa_core::config::{resolve_with_base, Config, Settings};
use docqa_core::error::Error;
use docqa_core::extract::ExtractorRegistry;
use docqa_core::types::Document;

const FOX: &str = "the quick brown fox jumps over the lazy dog";

#[test]
fn chunk_text_fox_scenario() {
    let chunks = chunk_text(FOX, 4, 1).expect("chunk");
    assert_eq!(chunks, vec!["the quick brown fox", "fox jumps over the", "the lazy dog"]);
}

#[test]
fn chunk_text_respects_size_and_covers_every_word() {
    let text: String = (0..1234).map(|i| format!("w{} ", i)).collect();
    let words: Vec<&str> = text.split_whitespace().collect();
    for (size, overlap) in [(500, 50), (7, 3), (1, 0), (10, 9)] {
        let chunks = chunk_text(&text, size, overlap).expect("chunk");
        let stride = size - overlap;
        let mut rebuilt: Vec<String> = Vec::new();
        for (i, c) in chunks.iter().enumerate() {
            let cw: Vec<&str> = c.split_whitespace().collect();
            assert!(cw.len() <= size, "chunk {} has {} words (size {})", i, cw.len(), size);
            // Each window starts at i * stride; keep only the part not already emitted.
            let already = rebuilt.len() - i * stride;
            rebuilt.extend(cw.iter().skip(already).map(|w| w.to_string()));
        }
        assert_eq!(rebuilt, words, "size={} overlap={}", size, overlap);
    }
}

#[test]
fn consecutive_chunks_share_the_overlap() {
    let text: String = (0..30).map(|i| format!("t{} ", i)).collect();
    let chunks = chunk_text(&text, 10, 4).expect("chunk");
    for pair in chunks.windows(2) {
        let a: Vec<&str> = pair[0].split_whitespace().collect();
        let b: Vec<&str> = pair[1].split_whitespace().collect();
        assert_eq!(&a[a.len() - 4..], &b[..4.min(b.len())]);
    }
}

#[test]
fn chunk_text_empty_and_invalid() {
    assert!(chunk_text("", 500, 50).expect("empty").is_empty());
    assert!(matches!(chunk_text(FOX, 4, 4), Err(Error::InvalidConfig(_))));
    assert!(matches!(chunk_text(FOX, 4, 9), Err(Error::InvalidConfig(_))));
    assert!(matches!(chunk_text("", 0, 0), Err(Error::InvalidConfig(_))));
}

#[test]
fn chunk_document_joins_pages_and_numbers_chunks() {
    let doc = Document::new("fox.pdf", vec!["the quick brown fox jumps".into(), "over the lazy dog".into()]);
    let cfg = ChunkingConfig::new(4, 1).expect("cfg");
    let chunks = chunk_document(&doc, &cfg).expect("chunk");
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[1].text, "fox jumps over the");
    assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));
    assert!(chunks.iter().all(|c| c.source_id.as_deref() == Some("fox.pdf")));
}

#[test]
fn registry_lists_only_recognized_files_sorted() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b.txt"), "bravo").unwrap();
    fs::write(dir.join("a.txt"), "alpha").unwrap();
    fs::write(dir.join("c.png"), [0u8, 1, 2]).unwrap();

    let reg = ExtractorRegistry::default();
    let files = reg.list_documents(dir);
    let names: Vec<String> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);

    let doc = reg.extract(&files[0]).expect("extract");
    assert_eq!(doc.source_id, "a.txt");
    assert_eq!(doc.pages, vec!["alpha".to_string()]);
}

#[test]
fn plain_text_extraction_tolerates_invalid_utf8() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("latin1.txt");
    fs::write(&path, [b'c', b'a', b'f', 0xE9, b' ', b'o', b'k']).unwrap();
    let doc = ExtractorRegistry::default().extract(&path).expect("extract");
    assert!(doc.text().ends_with(" ok"));
}

#[test]
fn malformed_pdf_is_an_extraction_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.pdf");
    fs::write(&path, b"this is not a pdf").unwrap();
    let err = ExtractorRegistry::default().extract(&path).unwrap_err();
    assert!(matches!(err, Error::Extraction { ref source_id, .. } if source_id == "broken.pdf"));
}

#[test]
fn settings_defaults_and_overrides() {
    let defaults = Settings::default();
    assert_eq!(defaults.chunking, ChunkingConfig { chunk_size: 500, overlap: 50 });
    assert_eq!(defaults.retrieval.top_k, 3);
    assert_eq!(defaults.generation.max_tokens, 200);

    let figment = Figment::new().merge(Toml::string(
        "[retrieval]\ntop_k = 5\n[generation]\nmodel = \"tiny\"\n",
    ));
    let settings = Config::from_figment(figment).settings().expect("settings");
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.generation.model, "tiny");
    assert_eq!(settings.data.index_dir, "vectorstore");
}

#[test]
fn settings_reject_bad_values_before_io() {
    let figment = Figment::new().merge(Toml::string("[chunking]\nchunk_size = 50\noverlap = 50\n"));
    assert!(Config::from_figment(figment).settings().is_err());
    let figment = Figment::new().merge(Toml::string("[retrieval]\ntop_k = 0\n"));
    assert!(Config::from_figment(figment).settings().is_err());
}

#[test]
fn resolve_relative_and_absolute_paths() {
    let base = std::path::Path::new("/srv/app");
    assert_eq!(resolve_with_base(base, "docs"), base.join("docs"));
    assert_eq!(resolve_with_base(base, "/data/docs"), std::path::PathBuf::from("/data/docs"));
}
