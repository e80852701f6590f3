use std::path::Path;

use super::{DocumentLoader, LoaderError, LoaderResult, source_of};
use crate::documents::Document;

/// Loads a UTF-8 text file as a single document.
#[derive(Debug, Clone, Default)]
pub struct TextLoader;

impl TextLoader {
    /// Create a new text loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> LoaderResult<Vec<Document>> {
        let content = std::fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;

        Ok(vec![
            Document::new(content).with_metadata("source", source_of(path)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn text_loader_loads_file() {
        let mut f = NamedTempFile::with_suffix(".txt").unwrap();
        f.write_all(b"Hello, world!\nSecond line.").unwrap();

        let docs = TextLoader::new().load(f.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page_content, "Hello, world!\nSecond line.");
        assert_eq!(docs[0].source(), Some(f.path().display().to_string().as_str()));
    }

    #[test]
    fn text_loader_keeps_empty_file() {
        let f = NamedTempFile::with_suffix(".txt").unwrap();
        let docs = TextLoader::new().load(f.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].page_content.is_empty());
    }

    #[test]
    fn text_loader_rejects_invalid_utf8() {
        let mut f = NamedTempFile::with_suffix(".txt").unwrap();
        f.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            TextLoader::new().load(f.path()),
            Err(LoaderError::Io { .. })
        ));
    }
}
