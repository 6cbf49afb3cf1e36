//! On-disk form of a [`FlatIndex`].
//!
//! Two JSON artifacts live in the index directory:
//! - `chunks.json`: chunk texts and provenance, in position order
//! - `vectors.json`: a header (embedder id, dimension, count, digest of
//!   `chunks.json`) followed by one vector row per chunk
//!
//! Each file is written to a temporary sibling and renamed into place. The
//! digest ties the pair together, so a pair from two different builds, or one
//! left half-replaced by an interrupted build, is reported as corrupt.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;

use crate::flat::FlatIndex;

pub const VECTORS_FILE: &str = "vectors.json";
pub const CHUNKS_FILE: &str = "chunks.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub format_version: u32,
    pub embedder_id: String,
    pub dim: usize,
    pub count: usize,
    pub chunks_digest: String,
    pub built_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct VectorArtifact {
    header: IndexHeader,
    vectors: Vec<Vec<f32>>,
}

/// Header-only view; the vector rows are skipped while parsing.
#[derive(Deserialize)]
struct HeaderView {
    header: IndexHeader,
}

#[derive(Serialize, Deserialize)]
struct ChunkArtifact {
    format_version: u32,
    chunks: Vec<Chunk>,
}

/// Whether `dir` holds both artifacts.
pub fn index_exists(dir: &Path) -> bool {
    dir.join(VECTORS_FILE).is_file() && dir.join(CHUNKS_FILE).is_file()
}

/// Write both artifacts, replacing any previous index in `dir`.
pub fn persist(index: &FlatIndex, dir: &Path) -> Result<IndexHeader> {
    fs::create_dir_all(dir)?;

    let chunk_bytes = serde_json::to_vec(&ChunkArtifact { format_version: FORMAT_VERSION, chunks: index.chunks.clone() })
        .map_err(|e| Error::corrupt(dir.join(CHUNKS_FILE), e))?;
    let header = IndexHeader {
        format_version: FORMAT_VERSION,
        embedder_id: index.embedder_id.clone(),
        dim: index.dim,
        count: index.chunks.len(),
        chunks_digest: blake3::hash(&chunk_bytes).to_hex().to_string(),
        built_at: Utc::now(),
    };
    let artifact = VectorArtifact {
        header: header.clone(),
        vectors: index.vectors.chunks_exact(index.dim).map(<[f32]>::to_vec).collect(),
    };
    let vector_bytes = serde_json::to_vec(&artifact).map_err(|e| Error::corrupt(dir.join(VECTORS_FILE), e))?;

    write_atomic(dir, CHUNKS_FILE, &chunk_bytes)?;
    write_atomic(dir, VECTORS_FILE, &vector_bytes)?;
    tracing::info!(dir = %dir.display(), count = header.count, dim = header.dim, "index persisted");
    Ok(header)
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(name)).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Load and cross-check both artifacts.
pub fn load(dir: &Path) -> Result<FlatIndex> {
    let vectors_path = dir.join(VECTORS_FILE);
    let chunks_path = dir.join(CHUNKS_FILE);
    let vector_bytes = fs::read(&vectors_path).map_err(|e| Error::corrupt(&vectors_path, e))?;
    let chunk_bytes = fs::read(&chunks_path).map_err(|e| Error::corrupt(&chunks_path, e))?;

    let artifact: VectorArtifact = serde_json::from_slice(&vector_bytes).map_err(|e| Error::corrupt(&vectors_path, e))?;
    let chunks: ChunkArtifact = serde_json::from_slice(&chunk_bytes).map_err(|e| Error::corrupt(&chunks_path, e))?;
    let header = artifact.header;

    if header.format_version != FORMAT_VERSION || chunks.format_version != FORMAT_VERSION {
        return Err(Error::corrupt(dir, format!(
            "unsupported format version {}/{} (expected {})",
            header.format_version, chunks.format_version, FORMAT_VERSION
        )));
    }
    if blake3::hash(&chunk_bytes).to_hex().as_str() != header.chunks_digest {
        return Err(Error::corrupt(dir, "chunks.json does not belong to vectors.json"));
    }
    if header.dim == 0 {
        return Err(Error::corrupt(&vectors_path, "dimension is zero"));
    }
    if artifact.vectors.len() != header.count || chunks.chunks.len() != header.count {
        return Err(Error::corrupt(dir, format!(
            "header declares {} entries but found {} vectors and {} chunks",
            header.count,
            artifact.vectors.len(),
            chunks.chunks.len()
        )));
    }

    let mut flat = Vec::with_capacity(header.count * header.dim);
    for (position, row) in artifact.vectors.iter().enumerate() {
        if row.len() != header.dim {
            return Err(Error::corrupt(&vectors_path, format!(
                "row {} has dimension {}, expected {}",
                position,
                row.len(),
                header.dim
            )));
        }
        flat.extend_from_slice(row);
    }
    tracing::debug!(dir = %dir.display(), count = header.count, embedder_id = %header.embedder_id, "index loaded");
    Ok(FlatIndex { embedder_id: header.embedder_id, dim: header.dim, chunks: chunks.chunks, vectors: flat })
}

/// Load an index and confirm it was built by the same embedder that will
/// embed queries against it.
pub fn load_for(dir: &Path, embedder: &dyn Embedder) -> Result<FlatIndex> {
    let index = load(dir)?;
    if index.embedder_id != embedder.embedder_id() || index.dim != embedder.dim() {
        return Err(Error::ModelMismatch {
            index_model: index.embedder_id,
            index_dim: index.dim,
            current_model: embedder.embedder_id().to_string(),
            current_dim: embedder.dim(),
        });
    }
    Ok(index)
}

/// Header of a persisted index without validating the chunk artifact.
pub fn read_header(dir: &Path) -> Result<IndexHeader> {
    let path = dir.join(VECTORS_FILE);
    let bytes = fs::read(&path).map_err(|e| Error::corrupt(&path, e))?;
    let view: HeaderView = serde_json::from_slice(&bytes).map_err(|e| Error::corrupt(&path, e))?;
    Ok(view.header)
}
