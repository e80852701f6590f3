use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::{DocumentLoader, LoaderError, LoaderResult, source_of};
use crate::documents::Document;

const DOCUMENT_XML: &str = "word/document.xml";

/// Runs, tabs, breaks and paragraph ends in WordprocessingML.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>|</w:p>")
        .expect("static regex")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(lt|gt|quot|apos|amp|#[0-9]+|#[xX][0-9a-fA-F]+);").expect("static regex")
});

/// Loads the body text of a Word document as a single document.
///
/// Paragraphs are separated by blank lines.
#[derive(Debug, Clone, Default)]
pub struct DocxLoader;

impl DocxLoader {
    /// Create a new DOCX loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for DocxLoader {
    fn load(&self, path: &Path) -> LoaderResult<Vec<Document>> {
        let file = std::fs::File::open(path).map_err(|e| LoaderError::io(path, e))?;
        let zip_error = |source| LoaderError::Docx {
            path: path.display().to_string(),
            source,
        };

        let mut archive = zip::ZipArchive::new(file).map_err(zip_error)?;
        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_XML)
            .map_err(zip_error)?
            .read_to_string(&mut xml)
            .map_err(|e| LoaderError::io(path, e))?;

        let text = extract_text(&xml);

        Ok(vec![
            Document::new(text).with_metadata("source", source_of(path)),
        ])
    }
}

fn extract_text(xml: &str) -> String {
    let mut text = String::new();

    for caps in TOKEN_RE.captures_iter(xml) {
        if let Some(run) = caps.get(1) {
            text.push_str(&unescape_xml(run.as_str()));
            continue;
        }

        let token = caps.get(0).map_or("", |m| m.as_str());
        if token.starts_with("<w:tab") {
            text.push('\t');
        } else if token == "</w:p>" {
            text.push_str("\n\n");
        } else {
            text.push('\n');
        }
    }

    text.trim_end().to_string()
}

/// Decode predefined entities and numeric character references in one pass.
///
/// References to invalid code points are left as written.
fn unescape_xml(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let number = &name[1..];
                    let code = match number.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => number.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
