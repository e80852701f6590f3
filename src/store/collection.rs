//! Named collection handle.

use std::sync::Arc;

use super::error::StoreResult;
use super::similarity::maximal_marginal_relevance;
use super::types::ChunkId;
use super::vector_store::VectorStore;
use crate::documents::Document;
use crate::embeddings::{EmbeddingError, Embeddings};
use crate::retriever::{Retriever, SearchOptions};

/// A named collection in a [`VectorStore`], bound to the embedding client
/// used for both inserts and queries.
#[derive(Clone)]
pub struct Collection {
    store: Arc<VectorStore>,
    name: String,
    embeddings: Arc<dyn Embeddings>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("embedding_model", &self.embeddings.model_name())
            .finish()
    }
}

impl Collection {
    pub(crate) fn new(store: Arc<VectorStore>, name: &str, embeddings: Arc<dyn Embeddings>) -> Self {
        Self {
            store,
            name: name.to_string(),
            embeddings,
        }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The store this collection lives in.
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Number of stored chunks.
    pub fn count(&self) -> usize {
        self.store.count(&self.name)
    }

    /// Embed and store documents, persisting before returning.
    pub async fn add_documents(&self, documents: &[Document]) -> StoreResult<Vec<ChunkId>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();
        let vectors = self.embeddings.embed_documents(&texts).await?;
        if vectors.len() != documents.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                documents.len(),
                vectors.len()
            ))
            .into());
        }

        self.store
            .add_chunks(&self.name, documents, &vectors, self.embeddings.model_name())
    }

    /// The `k` documents most similar to `query` with their cosine similarity, best first.
    pub async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> StoreResult<Vec<(Document, f32)>> {
        if k == 0 || self.count() == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embeddings.embed_query(query).await?;
        let mut scored = self.store.score_all(&self.name, &query_vector)?;
        scored.truncate(k);

        let ids: Vec<ChunkId> = scored.iter().map(|(id, _, _)| *id).collect();
        let documents = self.store.get_documents(&self.name, &ids)?;

        let results = documents
            .into_iter()
            .filter_map(|(id, document)| {
                scored
                    .iter()
                    .find(|(scored_id, _, _)| *scored_id == id)
                    .map(|(_, _, score)| (document, *score))
            })
            .collect();

        Ok(results)
    }

    /// The `k` documents most similar to `query`, best first.
    pub async fn similarity_search(&self, query: &str, k: usize) -> StoreResult<Vec<Document>> {
        Ok(self
            .similarity_search_with_score(query, k)
            .await?
            .into_iter()
            .map(|(document, _)| document)
            .collect())
    }

    /// Fetch `fetch_k` candidates and pick `k` of them by maximal marginal relevance.
    pub async fn max_marginal_relevance_search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        lambda_mult: f32,
    ) -> StoreResult<Vec<Document>> {
        if k == 0 || self.count() == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embeddings.embed_query(query).await?;
        let mut candidates = self.store.score_all(&self.name, &query_vector)?;
        candidates.truncate(fetch_k.max(k));

        let vectors: Vec<Vec<f32>> = candidates.iter().map(|(_, v, _)| v.clone()).collect();
        let picked = maximal_marginal_relevance(&query_vector, &vectors, k, lambda_mult);

        let ids: Vec<ChunkId> = picked.iter().map(|&i| candidates[i].0).collect();
        tracing::debug!(target: "store", "mmr picked {} of {} candidates", ids.len(), candidates.len());

        Ok(self
            .store
            .get_documents(&self.name, &ids)?
            .into_iter()
            .map(|(_, document)| document)
            .collect())
    }

    /// Wrap the collection in a retriever.
    pub fn as_retriever(&self, options: SearchOptions) -> Retriever {
        Retriever::new(self.clone(), options)
    }
}
