//! Persistent store behind every collection.
//!
//! Chunk text and metadata for all collections live in one tantivy index,
//! keyed by `collection_name`. Each collection has its own flat vector file,
//! and `state.json` holds the collection registry and the chunk id counter.
//!
//! A persist directory has one writing process at a time. Other processes
//! see committed state only after opening the store again.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{
    Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};

use super::collection::Collection;
use super::error::{StoreError, StoreResult};
use super::schema::ChunkSchema;
use super::similarity::cosine_similarity;
use super::types::{ChunkId, CollectionInfo, CollectionStats};
use super::vectors::VectorFile;
use crate::documents::{Document, Metadata};
use crate::embeddings::{EmbeddingError, Embeddings};
use crate::utils::get_utc_timestamp;

/// Tantivy writer heap, single indexing thread.
const WRITER_HEAP_SIZE: usize = 50_000_000;

const STATE_FILE: &str = "state.json";

/// Persisted registry of collections.
#[derive(Debug, Serialize, Deserialize)]
struct StoreState {
    collections: BTreeMap<String, CollectionInfo>,
    next_chunk_id: u32,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            collections: BTreeMap::new(),
            next_chunk_id: 1,
        }
    }
}

/// On-disk vector store holding any number of named collections.
pub struct VectorStore {
    /// Root directory (`tantivy/`, `vectors/`, `state.json`).
    persist_directory: PathBuf,

    index: Index,
    reader: IndexReader,
    schema: ChunkSchema,

    /// Index writer, created per write and dropped after commit to release
    /// the index lock.
    writer: Mutex<Option<IndexWriter<TantivyDocument>>>,

    state: Mutex<StoreState>,

    /// Vector files opened so far, by collection name.
    vectors: Mutex<HashMap<String, VectorFile>>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VectorStore")
            .field("persist_directory", &self.persist_directory)
            .field("collections", &state.collections.len())
            .field("next_chunk_id", &state.next_chunk_id)
            .finish()
    }
}

impl VectorStore {
    /// Open the store at `persist_directory`, creating it if needed.
    pub fn open(persist_directory: impl AsRef<Path>) -> StoreResult<Self> {
        let persist_directory = persist_directory.as_ref().to_path_buf();
        let index_path = persist_directory.join("tantivy");
        std::fs::create_dir_all(&index_path)?;
        std::fs::create_dir_all(persist_directory.join("vectors"))?;

        let (tantivy_schema, schema) = ChunkSchema::build();

        let existing = index_path.join("meta.json").exists();
        let index = if existing {
            Index::open_in_dir(&index_path)?
        } else {
            let dir = MmapDirectory::open(&index_path)?;
            Index::create(dir, tantivy_schema, IndexSettings::default())?
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        if existing {
            reader.reload()?;
        }

        let state_path = persist_directory.join(STATE_FILE);
        let state = if state_path.exists() {
            let content = std::fs::read_to_string(&state_path)?;
            serde_json::from_str(&content)?
        } else {
            StoreState::default()
        };

        tracing::debug!(
            target: "store",
            "opened store at {} ({} collections)",
            persist_directory.display(),
            state.collections.len()
        );

        Ok(Self {
            persist_directory,
            index,
            reader,
            schema,
            writer: Mutex::new(None),
            state: Mutex::new(state),
            vectors: Mutex::new(HashMap::new()),
        })
    }

    /// Root directory of the store.
    pub fn persist_directory(&self) -> &Path {
        &self.persist_directory
    }

    /// Handle to a collection, bound to an embedding client.
    ///
    /// The collection is created on its first insert; until then it is empty.
    pub fn collection(
        self: &Arc<Self>,
        name: &str,
        embeddings: Arc<dyn Embeddings>,
    ) -> StoreResult<Collection> {
        validate_collection_name(name)?;

        if let Some(info) = self.collection_info(name) {
            if info.embedding_model != embeddings.model_name() {
                tracing::warn!(
                    target: "store",
                    "collection '{name}' was built with {}, querying with {}",
                    info.embedding_model,
                    embeddings.model_name()
                );
            }
        }

        Ok(Collection::new(Arc::clone(self), name, embeddings))
    }

    /// Names of all collections, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        self.state.lock().collections.keys().cloned().collect()
    }

    /// Registry entry for a collection.
    pub fn collection_info(&self, name: &str) -> Option<CollectionInfo> {
        self.state.lock().collections.get(name).cloned()
    }

    /// Number of chunks in a collection; zero if it does not exist.
    pub fn count(&self, name: &str) -> usize {
        self.state
            .lock()
            .collections
            .get(name)
            .map_or(0, |info| info.chunk_count)
    }

    /// Delete a collection with its chunks and vectors.
    ///
    /// Returns the number of chunks removed.
    pub fn delete_collection(&self, name: &str) -> StoreResult<usize> {
        let mut state = self.state.lock();
        let info = state
            .collections
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        {
            let mut guard = self.writer.lock();
            let writer = self.ensure_writer(&mut guard)?;
            writer.delete_term(Term::from_field_text(self.schema.collection_name, name));
            writer.commit()?;
            *guard = None;
        }
        self.reader.reload()?;

        self.vectors.lock().remove(name);
        let vector_path = self.vector_path(name);
        if vector_path.exists() {
            std::fs::remove_file(&vector_path)?;
        }

        state.collections.remove(name);
        self.save_state(&state)?;

        tracing::info!(target: "store", "deleted collection '{name}' ({} chunks)", info.chunk_count);
        Ok(info.chunk_count)
    }

    /// Statistics about a collection.
    pub fn collection_stats(&self, name: &str) -> StoreResult<CollectionStats> {
        let info = self
            .collection_info(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        let searcher = self.reader.searcher();
        let query = self.collection_query(name);
        let chunk_count = searcher.search(&query, &Count)?;

        let mut sources = HashSet::new();
        for (_score, address) in searcher.search(&query, &TopDocs::with_limit(chunk_count.max(1)))? {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(source) = doc.get_first(self.schema.source).and_then(|v| v.as_str()) {
                if !source.is_empty() {
                    sources.insert(source.to_string());
                }
            }
        }

        let (vector_count, vector_bytes) = {
            let mut files = self.vectors.lock();
            let file = self.vector_file(&mut files, name, info.dimension)?;
            (file.vector_count(), file.size_bytes())
        };
        if vector_count != chunk_count {
            tracing::warn!(
                target: "store",
                "collection '{name}' has {chunk_count} chunks but {vector_count} vectors"
            );
        }

        Ok(CollectionStats {
            name: name.to_string(),
            chunk_count,
            source_count: sources.len(),
            dimension: info.dimension,
            embedding_model: info.embedding_model,
            vector_bytes,
        })
    }

    /// Store embedded documents in a collection and persist.
    pub(crate) fn add_chunks(
        &self,
        name: &str,
        documents: &[Document],
        vectors: &[Vec<f32>],
        embedding_model: &str,
    ) -> StoreResult<Vec<ChunkId>> {
        validate_collection_name(name)?;
        if documents.len() != vectors.len() {
            return Err(StoreError::Embedding(EmbeddingError::InvalidResponse(format!(
                "{} documents but {} vectors",
                documents.len(),
                vectors.len()
            ))));
        }
        let Some(dimension) = vectors.first().map(Vec::len) else {
            return Ok(Vec::new());
        };

        let mut state = self.state.lock();
        let expected = state
            .collections
            .get(name)
            .map_or(dimension, |info| info.dimension);
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(StoreError::DimensionMismatch {
                collection: name.to_string(),
                expected,
                actual: bad.len(),
            });
        }

        // Reserved ids are persisted first; a failed write leaves a gap.
        let ids = allocate_chunk_ids(&mut state, documents.len())?;
        self.save_state(&state)?;

        {
            let mut guard = self.writer.lock();
            let writer = self.ensure_writer(&mut guard)?;
            let now = get_utc_timestamp();

            for (id, document) in ids.iter().zip(documents) {
                writer.add_document(self.to_tantivy(*id, name, document, now))?;
            }

            writer.commit()?;
            *guard = None;
        }
        self.reader.reload()?;

        let batch: Vec<(ChunkId, &[f32])> = ids
            .iter()
            .zip(vectors)
            .map(|(id, vector)| (*id, vector.as_slice()))
            .collect();
        let mut files = self.vectors.lock();
        let written = self
            .vector_file(&mut files, name, dimension)
            .and_then(|file| file.write_batch(&batch));
        drop(files);
        if let Err(e) = written {
            if let Err(cleanup) = self.delete_chunks(&ids) {
                tracing::warn!(
                    target: "store",
                    "failed to remove chunks of aborted write to '{name}': {cleanup}"
                );
            }
            return Err(e);
        }

        let now = get_utc_timestamp();
        let info = state
            .collections
            .entry(name.to_string())
            .or_insert_with(|| CollectionInfo {
                dimension,
                embedding_model: embedding_model.to_string(),
                chunk_count: 0,
                created_at: now,
                updated_at: now,
            });
        info.chunk_count += ids.len();
        info.updated_at = now;
        self.save_state(&state)?;

        tracing::debug!(
            target: "store",
            "added {} chunks to '{name}' (ids {}..={})",
            ids.len(),
            ids[0],
            ids[ids.len() - 1]
        );

        Ok(ids)
    }

    /// Score every vector in a collection against `query`, best first.
    pub(crate) fn score_all(
        &self,
        name: &str,
        query: &[f32],
    ) -> StoreResult<Vec<(ChunkId, Vec<f32>, f32)>> {
        let Some(info) = self.collection_info(name) else {
            return Ok(Vec::new());
        };
        if query.len() != info.dimension {
            return Err(StoreError::DimensionMismatch {
                collection: name.to_string(),
                expected: info.dimension,
                actual: query.len(),
            });
        }

        let mut files = self.vectors.lock();
        let file = self.vector_file(&mut files, name, info.dimension)?;

        let mut scored: Vec<_> = file
            .read_all_vectors()
            .into_iter()
            .map(|(id, vector)| {
                let score = cosine_similarity(query, &vector);
                (id, vector, score)
            })
            .collect();

        scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored)
    }

    /// Load stored documents of a collection by chunk id, skipping ids with
    /// no stored chunk in that collection.
    pub(crate) fn get_documents(
        &self,
        name: &str,
        ids: &[ChunkId],
    ) -> StoreResult<Vec<(ChunkId, Document)>> {
        let searcher = self.reader.searcher();
        let mut documents = Vec::with_capacity(ids.len());

        for id in ids {
            let term = Term::from_field_u64(self.schema.chunk_id, u64::from(id.get()));
            let query = BooleanQuery::new(vec![
                (
                    Occur::Must,
                    Box::new(self.collection_query(name)) as Box<dyn Query>,
                ),
                (
                    Occur::Must,
                    Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
                ),
            ]);

            let Some((_score, address)) = searcher.search(&query, &TopDocs::with_limit(1))?.pop()
            else {
                tracing::warn!(target: "store", "chunk {id} has a vector but no stored text");
                continue;
            };

            let doc: TantivyDocument = searcher.doc(address)?;
            documents.push((*id, self.from_tantivy(&doc)));
        }

        Ok(documents)
    }

    /// Remove chunks from the index by id.
    fn delete_chunks(&self, ids: &[ChunkId]) -> StoreResult<()> {
        {
            let mut guard = self.writer.lock();
            let writer = self.ensure_writer(&mut guard)?;
            for id in ids {
                writer.delete_term(Term::from_field_u64(
                    self.schema.chunk_id,
                    u64::from(id.get()),
                ));
            }
            writer.commit()?;
            *guard = None;
        }
        self.reader.reload()?;
        Ok(())
    }

    fn to_tantivy(&self, id: ChunkId, name: &str, document: &Document, now: u64) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_u64(self.schema.chunk_id, u64::from(id.get()));
        doc.add_text(self.schema.collection_name, name);
        doc.add_text(self.schema.source, document.source().unwrap_or_default());
        doc.add_text(self.schema.content, &document.page_content);
        doc.add_text(
            self.schema.metadata,
            serde_json::Value::Object(document.metadata.clone()).to_string(),
        );
        doc.add_u64(self.schema.char_count, document.char_count() as u64);
        doc.add_u64(self.schema.indexed_at, now);
        doc
    }

    fn from_tantivy(&self, doc: &TantivyDocument) -> Document {
        let page_content = doc
            .get_first(self.schema.content)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let metadata = doc
            .get_first(self.schema.metadata)
            .and_then(|v| v.as_str())
            .and_then(|json| serde_json::from_str::<Metadata>(json).ok())
            .unwrap_or_default();

        Document {
            page_content,
            metadata,
        }
    }

    fn collection_query(&self, name: &str) -> TermQuery {
        let term = Term::from_field_text(self.schema.collection_name, name);
        TermQuery::new(term, IndexRecordOption::Basic)
    }

    fn ensure_writer<'a>(
        &self,
        guard: &'a mut Option<IndexWriter<TantivyDocument>>,
    ) -> StoreResult<&'a mut IndexWriter<TantivyDocument>> {
        let writer = match guard.take() {
            Some(writer) => writer,
            None => self.index.writer_with_num_threads(1, WRITER_HEAP_SIZE)?,
        };
        Ok(guard.insert(writer))
    }

    fn vector_path(&self, name: &str) -> PathBuf {
        self.persist_directory
            .join("vectors")
            .join(format!("{name}.vec"))
    }

    fn vector_file<'a>(
        &self,
        files: &'a mut HashMap<String, VectorFile>,
        name: &str,
        dimension: usize,
    ) -> StoreResult<&'a mut VectorFile> {
        match files.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let file = VectorFile::open_or_create(self.vector_path(name), dimension)?;
                if file.dimension() != dimension {
                    return Err(StoreError::DimensionMismatch {
                        collection: name.to_string(),
                        expected: file.dimension(),
                        actual: dimension,
                    });
                }
                Ok(entry.insert(file))
            }
        }
    }

    fn save_state(&self, state: &StoreState) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(self.persist_directory.join(STATE_FILE), content)?;
        Ok(())
    }
}

fn allocate_chunk_ids(state: &mut StoreState, count: usize) -> StoreResult<Vec<ChunkId>> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let id = ChunkId::from_u32(state.next_chunk_id).ok_or(StoreError::ChunkIdsExhausted)?;
        state.next_chunk_id = state
            .next_chunk_id
            .checked_add(1)
            .ok_or(StoreError::ChunkIdsExhausted)?;
        ids.push(id);
    }
    Ok(ids)
}

/// Collection names double as file names.
fn validate_collection_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollectionName(name.to_string()))
    }
}
