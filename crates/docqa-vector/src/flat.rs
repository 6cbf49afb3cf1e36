//! Exact nearest-neighbour index over a flat, row-major vector buffer.

use std::cmp::Ordering;

use docqa_core::error::{Error, Result};
use docqa_core::traits::VectorSearch;
use docqa_core::types::{Chunk, IndexEntry, SearchHit};

use crate::distance::squared_l2;

/// Every stored vector is compared against the query; results are exact.
///
/// Entries keep their insertion position for the life of the index, and
/// equal distances are ordered by that position.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    pub(crate) embedder_id: String,
    pub(crate) dim: usize,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn build(entries: Vec<IndexEntry>, embedder_id: impl Into<String>) -> Result<Self> {
        let dim = match entries.first() {
            Some(e) => e.vector.len(),
            None => return Err(Error::EmptyInput),
        };
        if dim == 0 {
            return Err(Error::InvalidArgument("vectors must have at least one dimension".into()));
        }
        let mut chunks = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len() * dim);
        for (position, entry) in entries.into_iter().enumerate() {
            if entry.vector.len() != dim {
                return Err(Error::InvalidArgument(format!(
                    "entry {} has dimension {}, expected {}",
                    position,
                    entry.vector.len(),
                    dim
                )));
            }
            vectors.extend_from_slice(&entry.vector);
            chunks.push(entry.chunk);
        }
        Ok(Self { embedder_id: embedder_id.into(), dim, chunks, vectors })
    }

    /// Identifier of the embedder that produced the stored vectors.
    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        self.vectors.get(start..start + self.dim)
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.vectors.chunks_exact(self.dim)
    }
}

impl VectorSearch for FlatIndex {
    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Err(Error::InvalidArgument("top_k must be at least 1".into()));
        }
        if query.len() != self.dim {
            return Err(Error::InvalidArgument(format!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.dim
            )));
        }
        let mut scored: Vec<(usize, f32)> = self
            .rows()
            .enumerate()
            .map(|(position, row)| (position, squared_l2(query, row)))
            .collect();
        scored.sort_by(|a, b| match a.1.total_cmp(&b.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        scored.truncate(top_k);
        Ok(scored
            .into_iter()
            .map(|(position, distance)| SearchHit { position, distance, chunk: self.chunks[position].clone() })
            .collect())
    }
}
