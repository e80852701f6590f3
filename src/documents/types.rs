//! Core document type shared by loaders, the splitter and the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form document metadata (`source`, `page`, `row`, ...).
pub type Metadata = serde_json::Map<String, Value>;

/// A unit of loaded text with its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The text content.
    pub page_content: String,

    /// Metadata describing where the content came from.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document without metadata.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `source` metadata entry, if it is a string.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }

    /// Get a preview of the content (first N characters).
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.page_content.char_indices().nth(max_chars) {
            Some((end, _)) => &self.page_content[..end],
            None => &self.page_content,
        }
    }

    /// Get the length of the content in characters.
    pub fn char_count(&self) -> usize {
        self.page_content.chars().count()
    }
}
