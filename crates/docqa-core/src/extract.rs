//! Document text extraction.
//!
//! Extractors turn one file into a [`Document`] of page texts. The registry
//! dispatches on file extension and enumerates candidate files under a source
//! directory. Pages that carry no text are dropped.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::traits::DocumentExtractor;
use crate::types::Document;

/// PDF text via `pdf-extract`; pages are split on form feeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl DocumentExtractor for PdfExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn extract(&self, path: &Path) -> Result<Document> {
        let source_id = source_id_for(path);
        let bytes = fs::read(path).map_err(|e| Error::extraction(&source_id, e))?;
        // pdf-extract panics on some malformed inputs
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| Error::extraction(&source_id, "pdf parser panicked"))?
            .map_err(|e| Error::extraction(&source_id, e))?;
        let pages: Vec<String> = text
            .split('\x0C')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        tracing::debug!(source_id = %source_id, pages = pages.len(), "extracted pdf");
        Ok(Document::new(source_id, pages))
    }
}

/// Plain text files, read as UTF-8 with a lossy fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["txt", "md"]
    }

    fn extract(&self, path: &Path) -> Result<Document> {
        let source_id = source_id_for(path);
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                let bytes = fs::read(path).map_err(|e| Error::extraction(&source_id, e))?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
        };
        let pages = if content.trim().is_empty() { Vec::new() } else { vec![content] };
        Ok(Document::new(source_id, pages))
    }
}

pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn DocumentExtractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new().with(PdfExtractor).with(PlainTextExtractor)
    }
}

impl ExtractorRegistry {
    /// A registry that recognizes nothing until extractors are added.
    pub fn new() -> Self {
        Self { extractors: Vec::new() }
    }

    pub fn with(mut self, extractor: impl DocumentExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    pub fn for_path(&self, path: &Path) -> Option<&dyn DocumentExtractor> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extractors
            .iter()
            .find(|x| x.extensions().contains(&ext.as_str()))
            .map(|x| &**x)
    }

    pub fn recognizes(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }

    /// Recognized files under `root`, sorted for a stable build order.
    pub fn list_documents(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.recognizes(e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    pub fn extract(&self, path: &Path) -> Result<Document> {
        match self.for_path(path) {
            Some(extractor) => extractor.extract(path),
            None => Err(Error::extraction(source_id_for(path), "unrecognized file extension")),
        }
    }
}

fn source_id_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_dispatches_case_insensitively() {
        let reg = ExtractorRegistry::default();
        assert!(reg.recognizes(Path::new("a/Report.PDF")));
        assert!(reg.recognizes(Path::new("notes.txt")));
        assert!(!reg.recognizes(Path::new("image.png")));
        assert!(!reg.recognizes(Path::new("README")));
    }
}
