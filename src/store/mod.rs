//! Persistent vector collections.
//!
//! A [`VectorStore`] lives in one directory (`./persist` by default):
//!
//! ```text
//! persist/
//! ├── tantivy/             chunk text and metadata, all collections
//! ├── vectors/<name>.vec   memory-mapped embeddings, one file per collection
//! └── state.json           collection registry and chunk id counter
//! ```
//!
//! Search is exact: every vector in the collection is scored by cosine
//! similarity against the query.

mod collection;
mod error;
mod schema;
pub mod similarity;
mod types;
mod vector_store;
mod vectors;

pub use collection::Collection;
pub use error::{StoreError, StoreResult};
pub use types::{ChunkId, CollectionInfo, CollectionStats};
pub use vector_store::VectorStore;
