use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{EmbeddingError, EmbeddingResult, Embeddings};
use crate::config::{EmbeddingsConfig, OpenAiConfig};
use crate::utils::api_error_message;

/// Embeddings from an OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    client: Client,
    base_url: String,
    api_key: String,
    organization: Option<String>,
    model: String,
    batch_size: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbeddings {
    pub const DEFAULT_MODEL: &'static str = "text-embedding-ada-002";
    pub const DEFAULT_BATCH_SIZE: usize = 1000;

    /// Client for the public OpenAI API with the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: OpenAiConfig::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            organization: None,
            model: Self::DEFAULT_MODEL.to_string(),
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    /// Client configured from the `[openai]` and `[embeddings]` settings.
    pub fn from_config(openai: &OpenAiConfig, config: &EmbeddingsConfig) -> EmbeddingResult<Self> {
        let api_key = openai.resolved_api_key().ok_or(EmbeddingError::MissingApiKey)?;

        let mut embeddings = Self::new(api_key)
            .with_base_url(&openai.base_url)
            .with_model(&config.model)
            .with_batch_size(config.batch_size);
        embeddings.organization = openai.organization.clone();
        Ok(embeddings)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Maximum number of texts per request. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn embed_batch(&self, batch: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": batch,
        });

        let mut request = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let mut payload: EmbeddingResponse = res.json().await?;
        if payload.data.len() != batch.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                payload.data.len()
            )));
        }

        payload.data.sort_by_key(|item| item.index);
        Ok(payload.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl Embeddings for OpenAiEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            tracing::debug!(
                target: "embeddings",
                "embedding {} texts with {}",
                batch.len(),
                self.model
            );
            vectors.extend(self.embed_batch(batch).await?);
        }

        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
