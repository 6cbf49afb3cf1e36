//! Turns a directory of documents into a [`FlatIndex`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use docqa_core::chunker::{chunk_document, ChunkingConfig};
use docqa_core::error::{Error, Result};
use docqa_core::extract::ExtractorRegistry;
use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, IndexEntry};

use crate::flat::FlatIndex;

/// A file that contributed nothing to the index, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub documents_indexed: usize,
    pub chunks: usize,
    pub skipped: Vec<SkippedDocument>,
    pub elapsed_ms: u128,
}

pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    extractors: ExtractorRegistry,
    chunking: ChunkingConfig,
    show_progress: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self {
            embedder,
            extractors: ExtractorRegistry::default(),
            chunking: ChunkingConfig::default(),
            show_progress: false,
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn build_from_directory(&self, path: &Path) -> Result<FlatIndex> {
        self.build_with_report(path).map(|(index, _)| index)
    }

    /// Extract, chunk and embed every recognized file under `path`.
    ///
    /// Files that fail extraction are skipped and listed in the report. A
    /// missing directory is created so the user has somewhere to put files,
    /// and the build then fails with [`Error::NoDocuments`].
    pub fn build_with_report(&self, path: &Path) -> Result<(FlatIndex, BuildReport)> {
        self.chunking.stride()?;
        let start = Instant::now();

        if !path.exists() {
            fs::create_dir_all(path)?;
            warn!(dir = %path.display(), "document directory did not exist; created it");
            return Err(Error::NoDocuments(path.to_path_buf()));
        }

        let files = self.extractors.list_documents(path);
        info!(dir = %path.display(), files = files.len(), "building index");

        let pb = if self.show_progress { ProgressBar::new(files.len() as u64) } else { ProgressBar::hidden() };
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut report = BuildReport::default();
        let mut chunks: Vec<Chunk> = Vec::new();
        for file in &files {
            pb.set_message(file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
            match self.extractors.extract(file) {
                Ok(doc) if doc.is_blank() => {
                    warn!(file = %file.display(), "no extractable text");
                    report.skipped.push(SkippedDocument { path: file.clone(), reason: "no extractable text".into() });
                }
                Ok(doc) => {
                    let doc_chunks = chunk_document(&doc, &self.chunking)?;
                    tracing::debug!(file = %file.display(), pages = doc.pages.len(), chunks = doc_chunks.len(), "chunked");
                    chunks.extend(doc_chunks);
                    report.documents_indexed += 1;
                }
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping document");
                    report.skipped.push(SkippedDocument { path: file.clone(), reason: e.to_string() });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if chunks.is_empty() {
            return Err(Error::NoDocuments(path.to_path_buf()));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(Error::ModelUnavailable(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        let entries = chunks.into_iter().zip(vectors).map(|(chunk, vector)| IndexEntry { chunk, vector }).collect();
        let index = FlatIndex::build(entries, self.embedder.embedder_id())?;

        report.chunks = index.chunks.len();
        report.elapsed_ms = start.elapsed().as_millis();
        info!(
            documents = report.documents_indexed,
            chunks = report.chunks,
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed_ms as u64,
            "index built"
        );
        Ok((index, report))
    }
}
