use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No documents with extractable text under {}; add documents and rebuild", .0.display())]
    NoDocuments(PathBuf),

    #[error("Failed to extract '{source_id}': {message}")]
    Extraction { source_id: String, message: String },

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Index was built with embedder '{index_model}' (d{index_dim}) but '{current_model}' (d{current_dim}) is loaded")]
    ModelMismatch {
        index_model: String,
        index_dim: usize,
        current_model: String,
        current_dim: usize,
    },

    #[error("Corrupt index at {}: {message}; rebuild required", path.display())]
    CorruptIndex { path: PathBuf, message: String },

    #[error("Cannot build an index from zero entries")]
    EmptyInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn extraction(source_id: impl Into<String>, message: impl ToString) -> Self {
        Self::Extraction { source_id: source_id.into(), message: message.to_string() }
    }

    pub fn corrupt(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::CorruptIndex { path: path.into(), message: message.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
