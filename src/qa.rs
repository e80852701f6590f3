//! Question answering over stored collections.
//!
//! [`Rag`] owns the clients every operation needs: the chat model, the
//! embedding client, the text splitter and the vector store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::Settings;
use crate::documents::{self, CharacterTextSplitter, Document, LoaderError, SplitterError};
use crate::embeddings::{self, EmbeddingError, Embeddings};
use crate::llm::{ChatModel, LlmError, OpenAiChat};
use crate::prompt::{ChatPromptTemplate, PromptError, format_documents};
use crate::retriever::{Retriever, RetrieverError, SearchOptions};
use crate::store::{ChunkId, Collection, StoreError, VectorStore};

/// Any failure from the layers below, passed through unchanged.
#[derive(Error, Debug)]
pub enum RagError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Splitter(#[from] SplitterError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Retriever(#[from] RetrieverError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

pub type RagResult<T> = Result<T, RagError>;

/// Loads, stores and queries documents with explicitly supplied clients.
pub struct Rag {
    llm: Arc<dyn ChatModel>,
    embeddings: Arc<dyn Embeddings>,
    splitter: CharacterTextSplitter,
    store: Arc<VectorStore>,
    search_defaults: SearchOptions,
    prompt: ChatPromptTemplate,
}

impl std::fmt::Debug for Rag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rag")
            .field("llm", &self.llm.model_name())
            .field("embeddings", &self.embeddings.model_name())
            .field("splitter", &self.splitter)
            .field("store", &self.store.persist_directory())
            .finish()
    }
}

impl Rag {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        embeddings: Arc<dyn Embeddings>,
        splitter: CharacterTextSplitter,
        store: Arc<VectorStore>,
    ) -> Self {
        Self {
            llm,
            embeddings,
            splitter,
            store,
            search_defaults: SearchOptions::default(),
            prompt: ChatPromptTemplate::rag(),
        }
    }

    /// Build every client from settings and open the store at `persist_directory`.
    pub fn from_settings(settings: &Settings) -> RagResult<Self> {
        let llm = Arc::new(OpenAiChat::from_config(&settings.openai, &settings.llm)?);
        let embeddings = embeddings::from_settings(settings)?;
        let splitter = CharacterTextSplitter::new(settings.chunking.clone())?;
        let store = Arc::new(VectorStore::open(&settings.persist_directory)?);

        let search_defaults = SearchOptions::from_config(&settings.retrieval)?;
        Ok(Self::new(llm, embeddings, splitter, store).with_search_defaults(search_defaults))
    }

    /// Options that [`Rag::load_retriever`] starts from before applying its arguments.
    #[must_use]
    pub fn with_search_defaults(mut self, options: SearchOptions) -> Self {
        self.search_defaults = options;
        self
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub fn search_defaults(&self) -> &SearchOptions {
        &self.search_defaults
    }

    /// Load a file with the loader for its extension.
    pub fn load_document(&self, path: impl AsRef<Path>) -> RagResult<Vec<Document>> {
        Ok(documents::load_document(path)?)
    }

    /// Split `documents` and store them in the collection `name`, creating it if needed.
    pub async fn create_collection(&self, name: &str, documents: &[Document]) -> RagResult<Collection> {
        let collection = self.load_collection(name)?;
        let ids = self.add_documents_to_collection(&collection, documents).await?;

        tracing::info!(
            target: "qa",
            "collection '{name}' created with {} chunks from {} documents",
            ids.len(),
            documents.len()
        );
        Ok(collection)
    }

    /// Open the persisted collection `name`.
    ///
    /// A name with nothing stored yet yields an empty collection.
    pub fn load_collection(&self, name: &str) -> RagResult<Collection> {
        Ok(self.store.collection(name, Arc::clone(&self.embeddings))?)
    }

    /// A retriever over collection `name` returning `k` documents.
    ///
    /// `search_type` is `similarity`, `mmr` or `similarity_score_threshold`.
    pub fn load_retriever(&self, name: &str, search_type: &str, k: usize) -> RagResult<Retriever> {
        let options = SearchOptions {
            search_type: search_type.parse()?,
            k,
            ..self.search_defaults.clone()
        };
        options.validate()?;

        Ok(self.load_collection(name)?.as_retriever(options))
    }

    /// Answer `question` from the context `retriever` finds.
    pub async fn ask_question(&self, retriever: &Retriever, question: &str) -> RagResult<String> {
        let context = retriever.retrieve(question).await?;
        self.answer_from_context(question, &context).await
    }

    /// Answer `question` from already retrieved context.
    pub async fn answer_from_context(
        &self,
        question: &str,
        context: &[Document],
    ) -> RagResult<String> {
        tracing::debug!(target: "qa", "answering with {} context chunks", context.len());

        let variables = HashMap::from([
            ("question", question.to_string()),
            ("context", format_documents(context)),
        ]);
        let messages = self.prompt.format_messages(&variables)?;

        let response = self.llm.invoke(&messages).await?;
        Ok(response.content)
    }

    /// Split `documents` and append them to `collection`.
    pub async fn add_documents_to_collection(
        &self,
        collection: &Collection,
        documents: &[Document],
    ) -> RagResult<Vec<ChunkId>> {
        let chunks = self.splitter.split_documents(documents);
        tracing::debug!(
            target: "qa",
            "split {} documents into {} chunks for '{}'",
            documents.len(),
            chunks.len(),
            collection.name()
        );

        Ok(collection.add_documents(&chunks).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingResult;
    use crate::llm::{ChatMessage, ChatResponse, LlmResult};
    use crate::retriever::SearchType;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    /// Counts vowels; enough to tell short texts apart.
    struct Vowels;

    #[async_trait]
    impl Embeddings for Vowels {
        async fn embed_documents(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    "aeiou"
                        .chars()
                        .map(|v| t.chars().filter(|c| *c == v).count() as f32 + 0.1)
                        .collect()
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "vowels"
        }
    }

    /// Records prompts and answers with a fixed reply.
    #[derive(Default)]
    struct Echo {
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatModel for Echo {
        async fn invoke(&self, messages: &[ChatMessage]) -> LlmResult<ChatResponse> {
            self.prompts.lock().push(messages.to_vec());
            Ok(ChatResponse {
                content: "forty-two".to_string(),
                model: "echo".to_string(),
                usage: None,
            })
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn rag(dir: &TempDir, llm: Arc<Echo>) -> Rag {
        let store = Arc::new(VectorStore::open(dir.path().join("persist")).unwrap());
        Rag::new(llm, Arc::new(Vowels), CharacterTextSplitter::default(), store)
    }

    #[tokio::test]
    async fn test_ask_question_uses_template() {
        let temp_dir = TempDir::new().unwrap();
        let llm = Arc::new(Echo::default());
        let rag = rag(&temp_dir, Arc::clone(&llm));

        rag.create_collection("answers", &[Document::new("aaaa")]).await.unwrap();
        let retriever = rag.load_retriever("answers", "similarity", 5).unwrap();
        let answer = rag.ask_question(&retriever, "what is a").await.unwrap();

        assert_eq!(answer, "forty-two");
        let prompts = llm.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert_eq!(
            prompts[0][0].content,
            "Answer this question using the provided context only.\n\nwhat is a\n\nContext:\naaaa"
        );
    }

    #[tokio::test]
    async fn test_answer_from_given_context() {
        let temp_dir = TempDir::new().unwrap();
        let llm = Arc::new(Echo::default());
        let rag = rag(&temp_dir, Arc::clone(&llm));

        let context = [Document::new("first"), Document::new("second")];
        let answer = rag.answer_from_context("which?", &context).await.unwrap();

        assert_eq!(answer, "forty-two");
        assert!(llm.prompts.lock()[0][0].content.ends_with("Context:\nfirst\n\nsecond"));
    }

    #[tokio::test]
    async fn test_create_collection_splits() {
        let temp_dir = TempDir::new().unwrap();
        let rag = rag(&temp_dir, Arc::new(Echo::default()));

        let long = format!("{}\n\n{}", "a".repeat(800), "e".repeat(800));
        let collection = rag.create_collection("long", &[Document::new(long)]).await.unwrap();
        assert_eq!(collection.count(), 2);

        rag.add_documents_to_collection(&collection, &[Document::new("ooo")])
            .await
            .unwrap();
        assert_eq!(rag.load_collection("long").unwrap().count(), 3);
    }

    #[test]
    fn test_load_retriever_options() {
        let temp_dir = TempDir::new().unwrap();
        let rag = rag(&temp_dir, Arc::new(Echo::default()));

        let retriever = rag.load_retriever("any", "mmr", 2).unwrap();
        assert_eq!(retriever.options().search_type, SearchType::Mmr);
        assert_eq!(retriever.options().k, 2);
        assert_eq!(retriever.options().fetch_k, 20);

        assert!(matches!(
            rag.load_retriever("any", "nearest", 5),
            Err(RagError::Retriever(RetrieverError::InvalidSearchType(_)))
        ));
        assert!(matches!(
            rag.load_retriever("any", "similarity_score_threshold", 5),
            Err(RagError::Retriever(RetrieverError::MissingScoreThreshold))
        ));
    }

    #[test]
    fn test_load_retriever_starts_from_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let rag = rag(&temp_dir, Arc::new(Echo::default())).with_search_defaults(
            SearchOptions::default()
                .with_score_threshold(0.4)
                .with_k(9),
        );

        let retriever = rag
            .load_retriever("any", "similarity_score_threshold", 3)
            .unwrap();
        assert_eq!(retriever.options().k, 3);
        assert_eq!(retriever.options().score_threshold, Some(0.4));
    }

    #[test]
    fn test_unsupported_file_type_passes_through() {
        let temp_dir = TempDir::new().unwrap();
        let rag = rag(&temp_dir, Arc::new(Echo::default()));

        let err = rag.load_document("notes.rtf").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .rtf");
    }
}
