//! Document question answering over persistent vector collections.
//!
//! Files are loaded into [`Document`]s, split into chunks, embedded and stored
//! in a named [`Collection`]. Questions are answered by retrieving the most
//! relevant chunks and prompting a chat model with them.

pub mod config;
pub mod documents;
pub mod embeddings;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod qa;
pub mod retriever;
pub mod store;
pub mod utils;

pub mod cli;

pub use config::Settings;
pub use documents::{CharacterTextSplitter, ChunkingConfig, Document, FileType, load_document};
pub use embeddings::{Embeddings, OpenAiEmbeddings};
pub use llm::{ChatMessage, ChatModel, OpenAiChat, Role};
pub use prompt::ChatPromptTemplate;
pub use qa::{Rag, RagError};
pub use retriever::{Retriever, SearchOptions, SearchType};
pub use store::{Collection, VectorStore};
