use std::path::Path;

use crate::error::Result;
use crate::types::{Document, SearchHit, Vector};

/// Maps texts to fixed-dimension vectors, one per input, order preserved.
///
/// `embedder_id` names the model and dimension; it is stored with a built
/// index and must match at load time.
pub trait Embedder: Send + Sync {
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>>;
}

/// Nearest-neighbour lookup over a built index.
pub trait VectorSearch: Send + Sync {
    fn len(&self) -> usize;
    fn dim(&self) -> usize;
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produces page texts for one file.
pub trait DocumentExtractor: Send + Sync {
    /// Lower-case file extensions handled by this extractor, without the dot.
    fn extensions(&self) -> &[&'static str];
    fn extract(&self, path: &Path) -> Result<Document>;
}
