//! Translation through an OpenAI-compatible Chat Completions endpoint.

use crate::error::{Result, SubtransError};
use crate::translate::{build_instruction, Translator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Translator using the OpenAI Chat Completions API.
pub struct OpenAiTranslator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAiTranslator {
    /// Create a new OpenAI translator with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "gpt-3.5-turbo".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
        }
    }

    /// Set a different model (e.g., "gpt-4o-mini").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, text: &str, source_lang: &str, target_lang: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: build_instruction(source_lang, target_lang),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: self.temperature,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        debug!(
            "Translating {} chars from {} to {} with {}",
            text.chars().count(),
            source_lang,
            target_lang,
            self.model
        );

        let request = self.build_request(text, source_lang, target_lang);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubtransError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubtransError::Http(e.without_url()))?;

        if !status.is_success() {
            return Err(SubtransError::Api(format!(
                "Translation API error ({}): {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)?;

        if let Some(error) = chat_response.error {
            return Err(SubtransError::Api(format!("OpenAI error: {}", error.message)));
        }

        let translated = chat_response
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if translated.is_empty() {
            return Err(SubtransError::Api(
                "Translation response contained no text".to_string(),
            ));
        }

        Ok(translated)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
