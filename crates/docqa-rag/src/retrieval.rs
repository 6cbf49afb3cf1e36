use std::sync::Arc;

use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, VectorSearch};
use docqa_core::types::SearchHit;

/// Embeds a query and looks up its nearest chunks.
#[derive(Clone)]
pub struct RetrievalService {
    index: Arc<dyn VectorSearch>,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalService {
    pub fn new(index: Arc<dyn VectorSearch>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Ranked hits, nearest first. Fewer than `top_k` when the index is small.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let vector = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .pop()
            .ok_or_else(|| Error::ModelUnavailable("embedder returned no vector for the query".into()))?;
        let hits = self.index.search(&vector, top_k)?;
        tracing::debug!(top_k, hits = hits.len(), "retrieved");
        Ok(hits)
    }

    /// Chunk texts of the `top_k` nearest entries, in ranked order.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(self.search(query, top_k)?.into_iter().map(|h| h.chunk.text).collect())
    }
}

/// Retrieved chunks as one context block, newline separated.
pub fn assemble_context(chunks: &[String]) -> String {
    chunks.join("\n")
}
