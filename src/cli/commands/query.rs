//! Ask and Search commands.

use std::sync::Arc;

use anyhow::{Result, bail};
use console::style;
use serde_json::json;

use crate::cli::progress::Spinner;
use crate::config::Settings;
use crate::embeddings;
use crate::qa::Rag;
use crate::store::VectorStore;

fn ensure_collection(store: &VectorStore, collection: &str) -> Result<()> {
    if store.collection_info(collection).is_none() {
        let known = store.list_collections();
        if known.is_empty() {
            bail!("Collection '{collection}' not found. No collections exist yet.");
        }
        bail!(
            "Collection '{collection}' not found. Available: {}",
            known.join(", ")
        );
    }
    Ok(())
}

/// Answer a question using a collection as context.
pub async fn run_ask(
    settings: &Settings,
    collection: &str,
    question: &str,
    k: Option<usize>,
    search_type: Option<&str>,
    show_context: bool,
) -> Result<()> {
    let rag = Rag::from_settings(settings)?;
    ensure_collection(rag.store(), collection)?;

    let defaults = rag.search_defaults();
    let search_type = search_type.unwrap_or(defaults.search_type.as_str());
    let retriever = rag.load_retriever(collection, search_type, k.unwrap_or(defaults.k))?;

    let context = if show_context {
        let context = retriever.retrieve(question).await?;
        for (i, document) in context.iter().enumerate() {
            eprintln!(
                "{} {}",
                style(format!("[{}]", i + 1)).dim(),
                style(document.source().unwrap_or("-")).dim()
            );
            eprintln!("{}\n", document.preview(300));
        }
        Some(context)
    } else {
        None
    };

    let spinner = Spinner::new(console::user_attended_stderr(), "Thinking");
    let answer = match context {
        Some(context) => rag.answer_from_context(question, &context).await?,
        None => rag.ask_question(&retriever, question).await?,
    };
    drop(spinner);

    println!("{answer}");
    Ok(())
}

/// Print the chunks most similar to a query.
pub async fn run_search(
    settings: &Settings,
    collection: &str,
    query: &str,
    k: usize,
    json: bool,
) -> Result<()> {
    let store = Arc::new(VectorStore::open(&settings.persist_directory)?);
    ensure_collection(&store, collection)?;

    let embeddings = embeddings::from_settings(settings)?;
    let results = store
        .collection(collection, embeddings)?
        .similarity_search_with_score(query, k)
        .await?;

    if json {
        let items: Vec<_> = results
            .iter()
            .map(|(document, score)| {
                json!({
                    "score": score,
                    "page_content": document.page_content,
                    "metadata": document.metadata,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if results.is_empty() {
        eprintln!("No results found.");
    } else {
        for (i, (document, score)) in results.iter().enumerate() {
            println!(
                "\n{}. {} (score: {:.3})",
                i + 1,
                style(document.source().unwrap_or("-")).cyan(),
                score
            );
            println!("   {}", document.preview(200).replace('\n', " "));
        }
    }
    Ok(())
}
