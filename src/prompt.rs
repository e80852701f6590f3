//! Chat prompt templates with `{name}` placeholders.
//!
//! `{{` and `}}` produce literal braces.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::documents::Document;
use crate::llm::{ChatMessage, Role};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing value for prompt variable '{0}'")]
    MissingVariable(String),

    #[error("Unclosed '{{' at byte {0} in prompt template")]
    Unclosed(usize),

    #[error("Unmatched '}}' at byte {0} in prompt template")]
    Unmatched(usize),
}

pub type PromptResult<T> = Result<T, PromptError>;

/// The question-answering prompt sent as a single user message.
pub const RAG_TEMPLATE: &str =
    "Answer this question using the provided context only.\n\n{question}\n\nContext:\n{context}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

fn parse(template: &str) -> PromptResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, ch)) => name.push(ch),
                        None => return Err(PromptError::Unclosed(pos)),
                    }
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name.trim().to_string()));
            }
            '}' => return Err(PromptError::Unmatched(pos)),
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// A list of role-tagged message templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPromptTemplate {
    messages: Vec<(Role, Vec<Segment>)>,
}

impl ChatPromptTemplate {
    /// Parse each `(role, template)` pair.
    pub fn from_messages<S: AsRef<str>>(messages: &[(Role, S)]) -> PromptResult<Self> {
        let messages = messages
            .iter()
            .map(|(role, template)| Ok((*role, parse(template.as_ref())?)))
            .collect::<PromptResult<Vec<_>>>()?;
        Ok(Self { messages })
    }

    /// Single user-message template.
    pub fn from_template(template: &str) -> PromptResult<Self> {
        Self::from_messages(&[(Role::User, template)])
    }

    /// The fixed question-answering template.
    pub fn rag() -> Self {
        Self {
            messages: vec![(
                Role::User,
                vec![
                    Segment::Literal(
                        "Answer this question using the provided context only.\n\n".to_string(),
                    ),
                    Segment::Variable("question".to_string()),
                    Segment::Literal("\n\nContext:\n".to_string()),
                    Segment::Variable("context".to_string()),
                ],
            )],
        }
    }

    /// Placeholder names, sorted and deduplicated.
    pub fn input_variables(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .messages
            .iter()
            .flat_map(|(_, segments)| segments)
            .filter_map(|segment| match segment {
                Segment::Variable(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect();
        names.into_iter().collect()
    }

    /// Substitute `variables` into every message.
    pub fn format_messages(&self, variables: &HashMap<&str, String>) -> PromptResult<Vec<ChatMessage>> {
        self.messages
            .iter()
            .map(|(role, segments)| {
                let mut content = String::new();
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => content.push_str(text),
                        Segment::Variable(name) => {
                            let value = variables
                                .get(name.as_str())
                                .ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                            content.push_str(value);
                        }
                    }
                }
                Ok(ChatMessage::new(*role, content))
            })
            .collect()
    }
}

/// Render retrieved documents as prompt context.
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_rag_template_text() {
        let messages = ChatPromptTemplate::rag()
            .format_messages(&vars(&[("question", "Who?"), ("context", "Alice did.")]))
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(
            messages[0].content,
            "Answer this question using the provided context only.\n\nWho?\n\nContext:\nAlice did."
        );
    }

    #[test]
    fn test_rag_matches_parsed_constant() {
        assert_eq!(
            ChatPromptTemplate::rag(),
            ChatPromptTemplate::from_template(RAG_TEMPLATE).unwrap()
        );
        assert_eq!(ChatPromptTemplate::rag().input_variables(), vec!["context", "question"]);
    }

    #[test]
    fn test_missing_variable() {
        let err = ChatPromptTemplate::rag()
            .format_messages(&vars(&[("question", "Who?")]))
            .unwrap_err();
        assert_eq!(err, PromptError::MissingVariable("context".to_string()));
    }

    #[test]
    fn test_escaped_braces_and_roles() {
        let template = ChatPromptTemplate::from_messages(&[
            (Role::System, "Reply as JSON like {{\"answer\": ...}}"),
            (Role::User, "{ topic }"),
        ])
        .unwrap();

        let messages = template.format_messages(&vars(&[("topic", "tides")])).unwrap();
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "Reply as JSON like {\"answer\": ...}");
        assert_eq!(messages[1].content, "tides");
    }

    #[test]
    fn test_malformed_templates() {
        assert_eq!(ChatPromptTemplate::from_template("ab {oops"), Err(PromptError::Unclosed(3)));
        assert_eq!(ChatPromptTemplate::from_template("a } b"), Err(PromptError::Unmatched(2)));
    }

    #[test]
    fn test_format_documents() {
        let docs = vec![Document::new("first chunk"), Document::new("second chunk")];
        assert_eq!(format_documents(&docs), "first chunk\n\nsecond chunk");
        assert_eq!(format_documents(&[]), "");
    }
}
