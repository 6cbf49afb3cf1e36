//! Domain types shared by the build and query phases.

use serde::{Deserialize, Serialize};

pub type Vector = Vec<f32>;

/// Raw text extracted from one source file.
///
/// Only lives for the duration of a build; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source_id: String,
    pub pages: Vec<String>,
}

impl Document {
    pub fn new(source_id: impl Into<String>, pages: Vec<String>) -> Self {
        Self { source_id: source_id.into(), pages }
    }

    /// Pages joined with a newline, in page order.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// A window of words from one document.
///
/// - `text`: the chunk payload, words joined by single spaces
/// - `source_id`: originating document, when known
/// - `index`: position of the chunk within its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub index: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source_id: Option<String>, index: usize) -> Self {
        Self { text: text.into(), source_id, index }
    }
}

/// One stored chunk and its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vector,
}

/// A ranked search result.
///
/// `position` is the entry's stable slot in the index. `distance` is the
/// squared Euclidean distance to the query; lower is better.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub distance: f32,
    pub chunk: Chunk,
}
