//! Character text splitter.
//!
//! Splits text on a fixed separator and greedily merges the pieces back into
//! chunks of at most `chunk_size` characters, carrying up to `chunk_overlap`
//! characters between consecutive chunks.

use std::collections::VecDeque;

use thiserror::Error;

use super::config::ChunkingConfig;
use super::types::Document;

/// Errors from splitter construction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SplitterError {
    #[error("Invalid chunking configuration: {0}")]
    InvalidConfig(String),
}

/// Splits documents into chunks bounded by a character count.
///
/// Algorithm:
/// 1. Split on the separator and drop empty pieces
/// 2. Cut pieces longer than `chunk_size` into fixed windows
/// 3. Merge consecutive pieces while the joined length fits
/// 4. Keep trailing pieces (up to `chunk_overlap` chars) as the start of the next chunk
#[derive(Debug, Clone)]
pub struct CharacterTextSplitter {
    config: ChunkingConfig,
}

impl Default for CharacterTextSplitter {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

impl CharacterTextSplitter {
    /// Create a splitter, rejecting invalid size/overlap combinations.
    pub fn new(config: ChunkingConfig) -> Result<Self, SplitterError> {
        config.validate().map_err(SplitterError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split raw text into chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let pieces = self.split_on_separator(text);
        let bounded = window_oversized(pieces, self.config.chunk_size);
        self.merge_splits(bounded)
    }

    /// Split each document, copying its metadata onto every chunk.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        let mut chunks = Vec::new();

        for document in documents {
            let text = &document.page_content;
            let mut previous: Option<(usize, usize)> = None;

            for chunk in self.split_text(text) {
                let mut metadata = document.metadata.clone();

                if self.config.add_start_index {
                    let search_from = previous.map_or(0, |(start, len)| {
                        start + overlap_start(&text[start..start + len], self.config.chunk_overlap)
                    });

                    if let Some(found) = text[search_from..].find(&chunk) {
                        let byte_index = search_from + found;
                        let char_index = text[..byte_index].chars().count();
                        metadata.insert("start_index".to_string(), char_index.into());
                        previous = Some((byte_index, chunk.len()));
                    }
                }

                chunks.push(Document {
                    page_content: chunk,
                    metadata,
                });
            }
        }

        tracing::debug!(
            target: "splitter",
            "split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        chunks
    }

    fn split_on_separator<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if self.config.separator.is_empty() {
            return text
                .char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect();
        }

        text.split(self.config.separator.as_str())
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    fn merge_splits(&self, splits: Vec<String>) -> Vec<String> {
        let separator_len = self.config.separator.chars().count();
        let chunk_size = self.config.chunk_size;
        let chunk_overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: VecDeque<(String, usize)> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = split.chars().count();
            let joiner = |current: &VecDeque<(String, usize)>| {
                if current.is_empty() { 0 } else { separator_len }
            };

            if total + len + joiner(&current) > chunk_size && !current.is_empty() {
                if let Some(doc) = self.join(&current) {
                    docs.push(doc);
                }

                // Drop leading pieces until only the overlap remains and the
                // next piece fits.
                while total > chunk_overlap
                    || (total + len + joiner(&current) > chunk_size && total > 0)
                {
                    let dropped_separator = if current.len() > 1 { separator_len } else { 0 };
                    let Some((_, first_len)) = current.pop_front() else {
                        break;
                    };
                    total = total.saturating_sub(first_len + dropped_separator);
                }
            }

            current.push_back((split, len));
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = self.join(&current) {
            docs.push(doc);
        }

        docs
    }

    fn join(&self, parts: &VecDeque<(String, usize)>) -> Option<String> {
        let joined = parts
            .iter()
            .map(|(piece, _)| piece.as_str())
            .collect::<Vec<_>>()
            .join(&self.config.separator);

        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Cut pieces longer than `max_chars` into consecutive windows of `max_chars`.
fn window_oversized(pieces: Vec<&str>, max_chars: usize) -> Vec<String> {
    let mut result = Vec::with_capacity(pieces.len());

    for piece in pieces {
        if piece.chars().count() <= max_chars {
            result.push(piece.to_string());
            continue;
        }

        let chars: Vec<char> = piece.chars().collect();
        for window in chars.chunks(max_chars.max(1)) {
            result.push(window.iter().collect());
        }
    }

    result
}

/// Byte offset inside `chunk` where its last `overlap` characters begin.
fn overlap_start(chunk: &str, overlap: usize) -> usize {
    if overlap == 0 {
        return chunk.len();
    }
    chunk
        .char_indices()
        .rev()
        .nth(overlap - 1)
        .map_or(0, |(i, _)| i)
}
