use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{ChatMessage, ChatModel, ChatResponse, LlmError, LlmResult, Usage};
use crate::config::{LlmConfig, OpenAiConfig};
use crate::utils::api_error_message;

/// Chat client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: String,
    organization: Option<String>,
    model: String,
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: OpenAiConfig::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            organization: None,
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: None,
        }
    }

    /// Client configured from the `[openai]` and `[llm]` settings.
    pub fn from_config(openai: &OpenAiConfig, config: &LlmConfig) -> LlmResult<Self> {
        let api_key = openai.resolved_api_key().ok_or(LlmError::MissingApiKey)?;

        let mut chat = Self::new(api_key)
            .with_base_url(&openai.base_url)
            .with_model(&config.model);
        chat.organization = openai.organization.clone();
        chat.temperature = config.temperature;
        Ok(chat)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn invoke(&self, messages: &[ChatMessage]) -> LlmResult<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        let mut request = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org);
        }

        tracing::debug!(target: "llm", "chat completion with {} ({} messages)", self.model, messages.len());

        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let payload: CompletionResponse = res.json().await?;
        let choice = payload.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;

        if let Some(usage) = &payload.usage {
            tracing::debug!(
                target: "llm",
                "tokens: {} prompt, {} completion",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: payload.model.unwrap_or_else(|| self.model.clone()),
            usage: payload.usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
