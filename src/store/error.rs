//! Error types for the vector store.

use tantivy::directory::error::OpenDirectoryError;
use thiserror::Error;

use crate::embeddings::EmbeddingError;

/// Errors from vector store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("Directory error: {0}")]
    Directory(#[from] OpenDirectoryError),

    #[error("Vector file error: {0}")]
    VectorFile(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Failed to read store state: {0}")]
    State(#[from] serde_json::Error),

    #[error(
        "Embedding dimension mismatch in collection '{collection}': expected {expected}, got {actual}"
    )]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid collection name '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidCollectionName(String),

    #[error("Chunk id space exhausted")]
    ChunkIdsExhausted,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
