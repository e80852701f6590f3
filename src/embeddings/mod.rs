//! Embedding clients.
//!
//! [`Embeddings`] turns text into vectors. The store embeds chunk contents on
//! insert and the query text on search through the same client, so a
//! collection must always be used with the model it was built with.

mod openai;
pub use openai::OpenAiEmbeddings;

#[cfg(feature = "fastembed")]
mod local;
#[cfg(feature = "fastembed")]
pub use local::FastEmbedEmbeddings;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Settings;

/// Errors from embedding generation.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("No API key configured. Set OPENAI_API_KEY or openai.api_key in settings")]
    MissingApiKey,

    #[error("Unknown embedding provider '{0}'")]
    UnknownProvider(String),

    #[error("Embedding model error: {0}")]
    Model(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// A text embedding model.
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Embed a batch of texts, one vector per input in the same order.
    async fn embed_documents(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding for query".to_string()))
    }

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}

/// Build the embedding client selected in settings.
pub fn from_settings(settings: &Settings) -> EmbeddingResult<Arc<dyn Embeddings>> {
    match settings.embeddings.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbeddings::from_config(
            &settings.openai,
            &settings.embeddings,
        )?)),
        #[cfg(feature = "fastembed")]
        "fastembed" => Ok(Arc::new(FastEmbedEmbeddings::from_model_name(
            &settings.embeddings.model,
        )?)),
        other => Err(EmbeddingError::UnknownProvider(other.to_string())),
    }
}
