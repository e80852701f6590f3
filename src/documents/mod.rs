//! Document loading and chunking.
//!
//! This module provides:
//! - Loaders for text, PDF, DOCX, CSV, HTML and Markdown files
//! - The [`Document`] type that flows through the rest of the crate
//! - A character splitter that cuts documents into bounded chunks

pub mod config;
pub mod loaders;
pub mod splitter;
pub mod types;

pub use config::ChunkingConfig;
pub use loaders::{DocumentLoader, FileType, LoaderError, load_document, load_documents};
pub use splitter::{CharacterTextSplitter, SplitterError};
pub use types::{Document, Metadata};
