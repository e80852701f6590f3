//! Configuration types for document chunking.

use serde::{Deserialize, Serialize};

/// Configuration for the character text splitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters carried over from the end of one chunk into the next.
    #[serde(default)]
    pub chunk_overlap: usize,

    /// Separator the text is split on before merging.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Record the character offset of each chunk as `start_index` metadata.
    #[serde(default)]
    pub add_start_index: bool,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_separator() -> String {
    "\n\n".to_string()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            separator: default_separator(),
            add_start_index: false,
        }
    }
}

impl ChunkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than zero".to_string());
        }

        if self.chunk_overlap > self.chunk_size {
            return Err(format!(
                "Got a larger chunk overlap ({}) than chunk size ({}), should be smaller.",
                self.chunk_overlap, self.chunk_size
            ));
        }

        Ok(())
    }
}
