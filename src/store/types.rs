//! Identifiers and bookkeeping types for the vector store.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Unique identifier for a stored chunk, shared by tantivy and the vector file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(NonZeroU32);

impl ChunkId {
    /// Create a ChunkId from a u32, returning None if zero.
    pub fn from_u32(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// Get the inner value as u32.
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry entry for a collection, persisted in `state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Embedding dimension, fixed by the first insert.
    pub dimension: usize,

    /// Model that produced the stored vectors.
    pub embedding_model: String,

    /// Number of stored chunks.
    pub chunk_count: usize,

    /// Creation time (UTC seconds).
    pub created_at: u64,

    /// Last insert time (UTC seconds).
    pub updated_at: u64,
}

/// Statistics about a collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// Number of chunks stored.
    pub chunk_count: usize,
    /// Number of distinct `source` values.
    pub source_count: usize,
    /// Embedding dimension.
    pub dimension: usize,
    /// Model that produced the vectors.
    pub embedding_model: String,
    /// Size of the vector file in bytes.
    pub vector_bytes: u64,
}
