//! Tantivy schema for stored chunks.

use tantivy::schema::{
    FAST, Field, IndexRecordOption, NumericOptions, STORED, STRING, Schema, SchemaBuilder,
    TextFieldIndexing, TextOptions,
};

/// Schema fields for chunk storage.
#[derive(Debug)]
pub struct ChunkSchema {
    /// Chunk identifier, also the key into the collection's vector file.
    pub chunk_id: Field,

    /// Collection name for filtering.
    pub collection_name: Field,

    /// `source` metadata value, for exact matching.
    pub source: Field,

    /// Full chunk text.
    pub content: Field,

    /// Document metadata as a JSON object string.
    pub metadata: Field,

    /// Character count of the chunk.
    pub char_count: Field,

    /// Timestamp when stored (UTC seconds).
    pub indexed_at: Field,
}

impl ChunkSchema {
    /// Build the schema for chunk storage.
    pub fn build() -> (Schema, Self) {
        let mut builder = SchemaBuilder::default();

        let indexed_u64 = NumericOptions::default()
            .set_indexed()
            .set_stored()
            .set_fast();
        let chunk_id = builder.add_u64_field("chunk_id", indexed_u64);

        // STRING for exact filtering
        let collection_name = builder.add_text_field("collection_name", STRING | STORED | FAST);
        let source = builder.add_text_field("source", STRING | STORED);

        let content = builder.add_text_field(
            "content",
            TextOptions::default()
                .set_indexing_options(
                    TextFieldIndexing::default()
                        .set_tokenizer("default")
                        .set_index_option(IndexRecordOption::WithFreqsAndPositions),
                )
                .set_stored(),
        );

        // Stored only, never queried
        let metadata = builder.add_text_field("metadata", STORED);
        let char_count = builder.add_u64_field("char_count", STORED);
        let indexed_at = builder.add_u64_field("indexed_at", STORED | FAST);

        let schema = builder.build();

        (
            schema,
            Self {
                chunk_id,
                collection_name,
                source,
                content,
                metadata,
                char_count,
                indexed_at,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_build() {
        let (schema, _fields) = ChunkSchema::build();

        for name in [
            "chunk_id",
            "collection_name",
            "source",
            "content",
            "metadata",
            "char_count",
            "indexed_at",
        ] {
            assert!(schema.get_field(name).is_ok(), "missing field {name}");
        }
        assert_eq!(schema.fields().count(), 7);
    }
}
