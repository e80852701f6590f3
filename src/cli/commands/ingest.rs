//! Ingest and Add commands.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use console::style;

use crate::cli::progress::Spinner;
use crate::config::Settings;
use crate::documents::Document;
use crate::qa::Rag;

/// Expand file arguments, treating any argument with `*`, `?` or `[` as a glob.
pub fn expand_paths(args: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for arg in args {
        if !arg.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(arg));
            continue;
        }

        let before = paths.len();
        for path in glob::glob(arg)
            .with_context(|| format!("Invalid glob pattern '{arg}'"))?
            .flatten()
        {
            if path.is_file() {
                paths.push(path);
            }
        }
        if paths.len() == before {
            bail!("No files match '{arg}'");
        }
    }

    Ok(paths)
}

fn load_all(rag: &Rag, paths: &[PathBuf], spinner: &Spinner) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for path in paths {
        spinner.set_message(format!("Loading {}", path.display()));
        let loaded = rag
            .load_document(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        documents.extend(loaded);
    }
    Ok(documents)
}

/// Load files and store them in `collection`, creating it if needed.
pub async fn run_ingest(
    settings: &Settings,
    collection: &str,
    files: &[String],
    progress: bool,
) -> Result<()> {
    let paths = expand_paths(files)?;
    let rag = Rag::from_settings(settings)?;

    let spinner = Spinner::new(progress, "Loading documents");
    let documents = load_all(&rag, &paths, &spinner)?;

    spinner.set_message(format!("Embedding {} documents into '{collection}'", documents.len()));
    let handle = rag.create_collection(collection, &documents).await?;

    spinner.finish(format!(
        "Ingested {} files into '{}' ({} chunks total)",
        paths.len(),
        style(collection).green(),
        handle.count()
    ));
    Ok(())
}

/// Load files into an existing collection.
pub async fn run_add(
    settings: &Settings,
    collection: &str,
    files: &[String],
    progress: bool,
) -> Result<()> {
    let paths = expand_paths(files)?;
    let rag = Rag::from_settings(settings)?;

    if rag.store().collection_info(collection).is_none() {
        bail!("Collection '{collection}' not found. Create it with 'docqa ingest {collection} <FILE>...'");
    }
    let handle = rag.load_collection(collection)?;

    let spinner = Spinner::new(progress, "Loading documents");
    let documents = load_all(&rag, &paths, &spinner)?;

    spinner.set_message(format!("Embedding {} documents into '{collection}'", documents.len()));
    let ids = rag.add_documents_to_collection(&handle, &documents).await?;

    spinner.finish(format!(
        "Added {} chunks to '{}' ({} chunks total)",
        ids.len(),
        style(collection).green(),
        handle.count()
    ));
    Ok(())
}
