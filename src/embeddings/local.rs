use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::{EmbeddingError, EmbeddingResult, Embeddings};

/// Local embeddings computed with fastembed (ONNX runtime).
pub struct FastEmbedEmbeddings {
    model: Arc<Mutex<TextEmbedding>>,
    name: String,
}

impl FastEmbedEmbeddings {
    /// Load a model by its short name, downloading it on first use.
    pub fn from_model_name(name: &str) -> EmbeddingResult<Self> {
        let model = parse_model(name)?;
        let text_model = TextEmbedding::try_new(
            InitOptions::new(model).with_show_download_progress(false),
        )
        .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        tracing::info!(target: "embeddings", "loaded local embedding model {name}");

        Ok(Self {
            model: Arc::new(Mutex::new(text_model)),
            name: name.to_string(),
        })
    }
}

fn parse_model(name: &str) -> EmbeddingResult<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" | "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "BGESmallENV15" | "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" | "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "MultilingualE5Small" | "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        other => Err(EmbeddingError::Model(format!(
            "unsupported local model '{other}'"
        ))),
    }
}

#[async_trait]
impl Embeddings for FastEmbedEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || model.lock().embed(texts, None))
            .await
            .map_err(|e| EmbeddingError::Model(e.to_string()))?
            .map_err(|e| EmbeddingError::Model(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_names() {
        assert!(matches!(
            parse_model("AllMiniLML6V2"),
            Ok(EmbeddingModel::AllMiniLML6V2)
        ));
        assert!(matches!(
            parse_model("bge-small-en-v1.5"),
            Ok(EmbeddingModel::BGESmallENV15)
        ));
        assert!(parse_model("text-embedding-ada-002").is_err());
    }
}
