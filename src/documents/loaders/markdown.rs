use std::path::Path;

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use super::{DocumentLoader, LoaderError, LoaderResult, source_of};
use crate::documents::Document;

/// Loads a Markdown file as a single plain-text document.
///
/// Formatting markers are dropped; block elements are separated by blank lines.
#[derive(Debug, Clone, Default)]
pub struct MarkdownLoader;

impl MarkdownLoader {
    /// Create a new Markdown loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for MarkdownLoader {
    fn load(&self, path: &Path) -> LoaderResult<Vec<Document>> {
        let markdown = std::fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;

        Ok(vec![
            Document::new(markdown_to_text(&markdown)).with_metadata("source", source_of(path)),
        ])
    }
}

/// Render Markdown to plain text.
pub(crate) fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Start(Tag::Item) => push_break(&mut out, 1),
            Event::End(TagEnd::Item | TagEnd::TableRow | TagEnd::TableHead) => {
                push_break(&mut out, 1);
            }
            Event::End(TagEnd::TableCell) => out.push('\t'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::CodeBlock
                | TagEnd::List(_)
                | TagEnd::Table,
            ) => push_break(&mut out, 2),
            Event::Rule => push_break(&mut out, 2),
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Make sure the output ends with at least `newlines` line breaks.
fn push_break(out: &mut String, newlines: usize) {
    if out.is_empty() {
        return;
    }
    let trailing = out.chars().rev().take_while(|c| *c == '\n').count();
    for _ in trailing..newlines {
        out.push('\n');
    }
}
