use std::path::Path;

use super::{DocumentLoader, LoaderError, LoaderResult, source_of};
use crate::documents::Document;

/// Loads a PDF as one document per page.
///
/// Page numbers in metadata are 0-based.
#[derive(Debug, Clone, Default)]
pub struct PdfLoader;

impl PdfLoader {
    /// Create a new PDF loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> LoaderResult<Vec<Document>> {
        let bytes = std::fs::read(path).map_err(|e| LoaderError::io(path, e))?;
        let pdf_error = |source| LoaderError::Pdf {
            path: path.display().to_string(),
            source,
        };

        let pdf = lopdf::Document::load_mem(&bytes).map_err(pdf_error)?;
        let pages = pdf.get_pages();
        let total_pages = pages.len();
        let source = source_of(path);

        let mut documents = Vec::with_capacity(total_pages);
        for (index, page_number) in pages.keys().enumerate() {
            let text = pdf.extract_text(&[*page_number]).map_err(pdf_error)?;

            documents.push(
                Document::new(text)
                    .with_metadata("source", source.clone())
                    .with_metadata("page", index)
                    .with_metadata("total_pages", total_pages),
            );
        }

        tracing::debug!(target: "loaders", "{}: {total_pages} pages", path.display());

        Ok(documents)
    }
}
