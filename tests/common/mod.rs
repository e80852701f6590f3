//! Deterministic stand-ins for the embedding and chat APIs.

#![allow(dead_code)]

use async_trait::async_trait;
use docqa::embeddings::{EmbeddingResult, Embeddings};
use docqa::llm::{ChatMessage, ChatModel, ChatResponse, LlmResult};
use parking_lot::Mutex;

/// Topic words, one embedding dimension each.
pub const TOPICS: [&str; 4] = ["cat", "rocket", "bread", "river"];

/// Counts topic words in lowercase text.
pub struct TopicEmbeddings;

pub fn topic_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    TOPICS
        .iter()
        .map(|topic| lower.matches(topic).count() as f32)
        .collect()
}

#[async_trait]
impl Embeddings for TopicEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| topic_vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "topic-counter"
    }
}

/// Replies with a fixed answer and remembers every prompt.
pub struct ScriptedChat {
    answer: String,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts
            .lock()
            .last()
            .and_then(|messages| messages.last())
            .map(|message| message.content.clone())
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn invoke(&self, messages: &[ChatMessage]) -> LlmResult<ChatResponse> {
        self.prompts.lock().push(messages.to_vec());
        Ok(ChatResponse {
            content: self.answer.clone(),
            model: "scripted".to_string(),
            usage: None,
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
