use std::path::Path;

use super::{DocumentLoader, LoaderError, LoaderResult, source_of};
use crate::documents::Document;

/// Loads a CSV file as one document per row.
///
/// The first row is the header. Each row renders as `header: value` lines.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvLoader {
    /// Create a new CSV loader using comma as the delimiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl DocumentLoader for CsvLoader {
    fn load(&self, path: &Path) -> LoaderResult<Vec<Document>> {
        let file = std::fs::File::open(path).map_err(|e| LoaderError::io(path, e))?;
        let csv_error = |source| LoaderError::Csv {
            path: path.display().to_string(),
            source,
        };

        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(file);
        let headers = reader.headers().map_err(csv_error)?.clone();
        let source = source_of(path);

        let mut documents = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_error)?;

            let content = headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| format!("{}: {}", header.trim(), value.trim()))
                .collect::<Vec<_>>()
                .join("\n");

            documents.push(
                Document::new(content)
                    .with_metadata("source", source.clone())
                    .with_metadata("row", row),
            );
        }

        tracing::debug!(target: "loaders", "{}: {} rows", path.display(), documents.len());

        Ok(documents)
    }
}
