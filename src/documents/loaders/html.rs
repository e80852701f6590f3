use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::markdown::markdown_to_text;
use super::{DocumentLoader, LoaderError, LoaderResult, source_of};
use crate::documents::Document;

static NON_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>|<!--.*?-->")
        .expect("static regex")
});

/// Loads an HTML page as a single plain-text document.
///
/// Scripts, styles and comments are dropped before conversion.
#[derive(Debug, Clone, Default)]
pub struct HtmlLoader;

impl HtmlLoader {
    /// Create a new HTML loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for HtmlLoader {
    fn load(&self, path: &Path) -> LoaderResult<Vec<Document>> {
        let html = std::fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;

        Ok(vec![
            Document::new(html_to_text(&html)).with_metadata("source", source_of(path)),
        ])
    }
}

fn html_to_text(html: &str) -> String {
    let cleaned = NON_CONTENT_RE.replace_all(html, "");
    let markdown = html2md::parse_html(&cleaned);
    markdown_to_text(&markdown)
}
