mod common;

use std::path::Path;
use std::sync::Arc;

use common::{ScriptedChat, TopicEmbeddings};
use docqa::qa::RagError;
use docqa::retriever::RetrieverError;
use docqa::{CharacterTextSplitter, Document, Rag, SearchOptions, SearchType, VectorStore};
use tempfile::TempDir;

const CAT: &str = "The cat sleeps on the windowsill all afternoon.";
const ROCKET: &str = "The rocket lifted off at dawn and the rocket stage separated.";
const BREAD: &str = "Good bread needs flour, water, salt and time.";

fn open_rag(persist: &Path, llm: Arc<ScriptedChat>) -> Rag {
    let store = Arc::new(VectorStore::open(persist).unwrap());
    Rag::new(
        llm,
        Arc::new(TopicEmbeddings),
        CharacterTextSplitter::default(),
        store,
    )
}

fn write_files(dir: &Path) -> Vec<std::path::PathBuf> {
    [("cat.txt", CAT), ("rocket.txt", ROCKET), ("bread.txt", BREAD)]
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            std::fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

async fn ingest(rag: &Rag, dir: &Path, name: &str) {
    let mut documents = Vec::new();
    for path in write_files(dir) {
        documents.extend(rag.load_document(&path).unwrap());
    }
    rag.create_collection(name, &documents).await.unwrap();
}

#[tokio::test]
async fn test_create_load_retrieve_ask() {
    let temp_dir = TempDir::new().unwrap();
    let persist = temp_dir.path().join("persist");

    {
        let rag = open_rag(&persist, Arc::new(ScriptedChat::new("unused")));
        ingest(&rag, temp_dir.path(), "notes").await;
        assert_eq!(rag.load_collection("notes").unwrap().count(), 3);
    }

    // Fresh store over the same directory
    let llm = Arc::new(ScriptedChat::new("On the windowsill."));
    let rag = open_rag(&persist, Arc::clone(&llm));

    let retriever = rag.load_retriever("notes", "similarity", 1).unwrap();
    let context = retriever.retrieve("Where does the cat sleep?").await.unwrap();
    assert_eq!(context.len(), 1);
    assert_eq!(context[0].page_content, CAT);
    assert!(context[0].source().unwrap().ends_with("cat.txt"));

    let answer = rag
        .ask_question(&retriever, "Where does the cat sleep?")
        .await
        .unwrap();
    assert_eq!(answer, "On the windowsill.");
    assert_eq!(
        llm.last_prompt().unwrap(),
        format!(
            "Answer this question using the provided context only.\n\nWhere does the cat sleep?\n\nContext:\n{CAT}"
        )
    );
}

#[tokio::test]
async fn test_add_documents_to_collection() {
    let temp_dir = TempDir::new().unwrap();
    let rag = open_rag(&temp_dir.path().join("persist"), Arc::new(ScriptedChat::new("ok")));
    ingest(&rag, temp_dir.path(), "notes").await;

    let collection = rag.load_collection("notes").unwrap();
    let river = Document::new("The river floods every spring.").with_metadata("source", "river.txt");
    let ids = rag
        .add_documents_to_collection(&collection, &[river])
        .await
        .unwrap();

    assert_eq!(ids.len(), 1);
    assert_eq!(collection.count(), 4);

    let found = collection.similarity_search("river banks", 1).await.unwrap();
    assert_eq!(found[0].source(), Some("river.txt"));
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let rag = open_rag(&temp_dir.path().join("persist"), Arc::new(ScriptedChat::new("ok")));

    rag.create_collection("pets", &[Document::new(CAT)]).await.unwrap();
    rag.create_collection("space", &[Document::new(ROCKET)]).await.unwrap();

    let pets = rag.load_retriever("pets", "similarity", 5).unwrap();
    let found = pets.retrieve("rocket launch").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].page_content, CAT);

    let mut names = rag.store().list_collections();
    names.sort();
    assert_eq!(names, vec!["pets", "space"]);
}

#[tokio::test]
async fn test_score_threshold_and_mmr() {
    let temp_dir = TempDir::new().unwrap();
    let rag = open_rag(&temp_dir.path().join("persist"), Arc::new(ScriptedChat::new("ok")));
    ingest(&rag, temp_dir.path(), "notes").await;

    let collection = rag.load_collection("notes").unwrap();

    let strict = collection.as_retriever(
        SearchOptions::default()
            .with_search_type(SearchType::SimilarityScoreThreshold)
            .with_score_threshold(0.5),
    );
    let found = strict.retrieve("rocket").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].page_content, ROCKET);

    let mmr = rag.load_retriever("notes", "mmr", 3).unwrap();
    let found = mmr.retrieve("cat").await.unwrap();
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].page_content, CAT);
}

#[tokio::test]
async fn test_unknown_collection_answers_without_context() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedChat::new("I don't know."));
    let rag = open_rag(&temp_dir.path().join("persist"), Arc::clone(&llm));

    let retriever = rag.load_retriever("nothing-here", "similarity", 5).unwrap();
    let answer = rag.ask_question(&retriever, "Anything?").await.unwrap();

    assert_eq!(answer, "I don't know.");
    assert!(llm.last_prompt().unwrap().ends_with("Context:\n"));
    assert!(rag.store().list_collections().is_empty());
}

#[tokio::test]
async fn test_errors_pass_through() {
    let temp_dir = TempDir::new().unwrap();
    let rag = open_rag(&temp_dir.path().join("persist"), Arc::new(ScriptedChat::new("ok")));

    assert!(matches!(
        rag.load_retriever("notes", "keyword", 5),
        Err(RagError::Retriever(RetrieverError::InvalidSearchType(_)))
    ));
    assert!(matches!(
        rag.load_document(temp_dir.path().join("missing.txt")),
        Err(RagError::Loader(_))
    ));
    assert!(matches!(rag.load_collection("bad/name"), Err(RagError::Store(_))));
}

#[tokio::test]
async fn test_delete_collection() {
    let temp_dir = TempDir::new().unwrap();
    let rag = open_rag(&temp_dir.path().join("persist"), Arc::new(ScriptedChat::new("ok")));
    ingest(&rag, temp_dir.path(), "notes").await;

    assert_eq!(rag.store().delete_collection("notes").unwrap(), 3);
    assert_eq!(rag.load_collection("notes").unwrap().count(), 0);
    assert!(rag.store().delete_collection("notes").is_err());
}
