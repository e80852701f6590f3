//! Collections, Stats and Delete commands.

use anyhow::Result;
use chrono::DateTime;
use console::style;

use crate::config::Settings;
use crate::store::{CollectionInfo, VectorStore};

fn format_time(secs: u64) -> String {
    DateTime::from_timestamp(secs as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// List all collections.
pub fn run_list(settings: &Settings, json: bool) -> Result<()> {
    let store = VectorStore::open(&settings.persist_directory)?;
    let collections: Vec<(String, CollectionInfo)> = store
        .list_collections()
        .into_iter()
        .filter_map(|name| store.collection_info(&name).map(|info| (name, info)))
        .collect();

    if json {
        let mut map = serde_json::Map::new();
        for (name, info) in collections {
            map.insert(name, serde_json::to_value(info)?);
        }
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else if collections.is_empty() {
        eprintln!("No collections in {}", settings.persist_directory.display());
        eprintln!("\nTo create one:");
        eprintln!("  docqa ingest <COLLECTION> <FILE>...");
    } else {
        println!("{}", style("Collections:").cyan().bold());
        for (name, info) in collections {
            println!(
                "  - {} ({} chunks, {}, updated {})",
                style(name).green(),
                info.chunk_count,
                info.embedding_model,
                format_time(info.updated_at)
            );
        }
    }
    Ok(())
}

/// Show statistics for one collection.
pub fn run_stats(settings: &Settings, collection: &str, json: bool) -> Result<()> {
    let store = VectorStore::open(&settings.persist_directory)?;
    let stats = store.collection_stats(collection)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Collection: {}", style(&stats.name).green());
        println!("  Chunks: {}", stats.chunk_count);
        println!("  Sources: {}", stats.source_count);
        println!("  Model: {} ({} dimensions)", stats.embedding_model, stats.dimension);
        println!("  Vector file: {} bytes", stats.vector_bytes);
    }
    Ok(())
}

/// Delete a collection.
pub fn run_delete(settings: &Settings, collection: &str) -> Result<()> {
    let store = VectorStore::open(&settings.persist_directory)?;
    let removed = store.delete_collection(collection)?;
    println!("Deleted collection '{collection}' ({removed} chunks)");
    Ok(())
}
