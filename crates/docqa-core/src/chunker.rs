//! Overlapping fixed-size word windows.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_OVERLAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let cfg = Self { chunk_size, overlap };
        cfg.stride()?;
        Ok(cfg)
    }

    /// Distance in words between the starts of consecutive windows.
    pub fn stride(&self) -> Result<usize> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than zero".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(self.chunk_size - self.overlap)
    }
}

/// Split `text` on whitespace and emit windows of up to `chunk_size` words
/// starting at offsets `0, stride, 2*stride, …` while the offset is inside
/// the word sequence. The last window may be short.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    let stride = ChunkingConfig { chunk_size, overlap }.stride()?;
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::with_capacity(words.len().div_ceil(stride));
    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += stride;
    }
    Ok(chunks)
}

/// Chunk a whole document, tagging each chunk with its source and position.
pub fn chunk_document(doc: &Document, cfg: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let texts = chunk_text(&doc.text(), cfg.chunk_size, cfg.overlap)?;
    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Chunk::new(text, Some(doc.source_id.clone()), i))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_rejects_non_terminating_configs() {
        assert!(ChunkingConfig::new(10, 10).is_err());
        assert!(ChunkingConfig::new(10, 11).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert_eq!(ChunkingConfig::new(10, 3).unwrap().stride().unwrap(), 7);
    }

    #[test]
    fn whitespace_only_text_has_no_chunks() {
        assert!(chunk_text(" \n\t ", 4, 1).unwrap().is_empty());
    }
}
