//! File loaders that turn files on disk into [`Document`]s.
//!
//! The loader is picked from the file extension through a static table.
//! Unknown extensions are rejected; every other failure comes straight from
//! the underlying reader or parser.

mod csv;
mod docx;
mod html;
mod markdown;
mod pdf;
mod text;

pub use self::csv::CsvLoader;
pub use self::docx::DocxLoader;
pub use self::html::HtmlLoader;
pub use self::markdown::MarkdownLoader;
pub use self::pdf::PdfLoader;
pub use self::text::TextLoader;

use std::path::Path;

use thiserror::Error;

use super::types::Document;

/// Errors from document loading.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoaderError {
    /// The extension has no registered loader.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// File IO error (includes the path that failed).
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF error in '{path}': {source}")]
    Pdf {
        path: String,
        #[source]
        source: lopdf::Error,
    },

    #[error("DOCX archive error in '{path}': {source}")]
    Docx {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: ::csv::Error,
    },
}

impl LoaderError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Trait for loading documents from a file.
pub trait DocumentLoader: Send + Sync {
    /// Load every document contained in the file at `path`.
    fn load(&self, path: &Path) -> LoaderResult<Vec<Document>>;
}

/// Supported file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Text,
    Pdf,
    Docx,
    Csv,
    Html,
    Markdown,
}

/// Extension (with leading dot) to file type.
const LOADER_TABLE: &[(&str, FileType)] = &[
    (".txt", FileType::Text),
    (".pdf", FileType::Pdf),
    (".docx", FileType::Docx),
    (".csv", FileType::Csv),
    (".html", FileType::Html),
    (".md", FileType::Markdown),
];

impl FileType {
    /// Look up the file type for a path by its extension.
    ///
    /// Matching is exact, so `.TXT` is not `.txt`.
    pub fn from_path(path: &Path) -> LoaderResult<Self> {
        let extension = extension_of(path);

        LOADER_TABLE
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, file_type)| *file_type)
            .ok_or(LoaderError::UnsupportedFileType(extension))
    }

    /// All extensions with a registered loader.
    pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
        LOADER_TABLE.iter().map(|(ext, _)| *ext)
    }

    /// Name of the loader that handles this file type.
    pub fn loader_name(&self) -> &'static str {
        match self {
            Self::Text => "TextLoader",
            Self::Pdf => "PdfLoader",
            Self::Docx => "DocxLoader",
            Self::Csv => "CsvLoader",
            Self::Html => "HtmlLoader",
            Self::Markdown => "MarkdownLoader",
        }
    }

    /// Create the loader for this file type.
    pub fn loader(&self) -> Box<dyn DocumentLoader> {
        match self {
            Self::Text => Box::new(TextLoader::new()),
            Self::Pdf => Box::new(PdfLoader::new()),
            Self::Docx => Box::new(DocxLoader::new()),
            Self::Csv => Box::new(CsvLoader::new()),
            Self::Html => Box::new(HtmlLoader::new()),
            Self::Markdown => Box::new(MarkdownLoader::new()),
        }
    }
}

/// Extension including the leading dot, or an empty string.
fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Load a document from a file path.
///
/// Supports `.txt`, `.pdf`, `.docx`, `.csv`, `.html` and `.md` files.
pub fn load_document(path: impl AsRef<Path>) -> LoaderResult<Vec<Document>> {
    let path = path.as_ref();
    let file_type = FileType::from_path(path)?;

    tracing::debug!(
        target: "loaders",
        "loading {} with {}",
        path.display(),
        file_type.loader_name()
    );

    file_type.loader().load(path)
}

/// Load several files in order, concatenating their documents.
pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> LoaderResult<Vec<Document>> {
    let mut documents = Vec::new();
    for path in paths {
        documents.extend(load_document(path)?);
    }
    Ok(documents)
}

/// Metadata `source` value for a path.
pub(crate) fn source_of(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_dispatch_table() {
        let cases = [
            ("notes.txt", FileType::Text, "TextLoader"),
            ("paper.pdf", FileType::Pdf, "PdfLoader"),
            ("report.docx", FileType::Docx, "DocxLoader"),
            ("table.csv", FileType::Csv, "CsvLoader"),
            ("page.html", FileType::Html, "HtmlLoader"),
            ("README.md", FileType::Markdown, "MarkdownLoader"),
        ];

        for (name, expected, loader) in cases {
            let file_type = FileType::from_path(&PathBuf::from(name)).unwrap();
            assert_eq!(file_type, expected, "{name}");
            assert_eq!(file_type.loader_name(), loader);
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FileType::from_path(Path::new("data.json")).unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFileType(ref ext) if ext == ".json"));
        assert_eq!(err.to_string(), "Unsupported file type: .json");
    }

    #[test]
    fn test_extension_match_is_exact() {
        assert!(FileType::from_path(Path::new("NOTES.TXT")).is_err());
        assert!(FileType::from_path(Path::new("page.htm")).is_err());
    }

    #[test]
    fn test_missing_extension() {
        let err = FileType::from_path(Path::new("Makefile")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: ");
    }

    #[test]
    fn test_load_document_rejects_before_touching_disk() {
        let err = load_document("/nonexistent/data.json").unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_load_document_missing_file() {
        let err = load_document("/nonexistent/notes.txt").unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }

    #[test]
    fn test_load_documents_concatenates() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.md");
        std::fs::write(&a, "first file").unwrap();
        std::fs::write(&b, "# Second\n\nfile").unwrap();

        let docs = load_documents(&[a, b]).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].page_content, "first file");
        assert!(docs[1].page_content.contains("Second"));
    }

    #[test]
    fn test_supported_extensions() {
        let exts: Vec<_> = FileType::supported_extensions().collect();
        assert_eq!(exts, vec![".txt", ".pdf", ".docx", ".csv", ".html", ".md"]);
    }
}
