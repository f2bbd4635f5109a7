//! Groq client: chat completions and Whisper transcription over the
//! OpenAI-compatible HTTP API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::{BotError, Result};
use crate::prompt::ChatMessage;

/// Anything able to turn a prompt into text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `messages` to `model` and return the generated text
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;

    /// Transcribe an audio file to text
    async fn transcribe(&self, model: &str, file_name: &str, audio: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Extract the first choice's text from a completion response body
pub fn parse_completion(body: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(body).map_err(|e| BotError::Api {
        status: 200,
        body: format!("unexpected completion payload: {e}"),
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(BotError::EmptyCompletion)
}

/// HTTP client for the Groq API.
///
/// Does not derive Debug so the API key never ends up in logs.
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn read_success_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(status = status.as_u16(), "Groq API returned an error");
            return Err(BotError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        debug!(model = %model, messages = messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest { model, messages })
            .send()
            .await?;

        let body = Self::read_success_body(response).await?;
        parse_completion(&body)
    }

    async fn transcribe(&self, model: &str, file_name: &str, audio: Vec<u8>) -> Result<String> {
        debug!(model = %model, bytes = audio.len(), "Sending transcription request");

        let form = Form::new()
            .part(
                "file",
                Part::bytes(audio)
                    .file_name(file_name.to_string())
                    .mime_str("application/octet-stream")?,
            )
            .text("model", model.to_string())
            .text("response_format", "json");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let body = Self::read_success_body(response).await?;
        let parsed: TranscriptionResponse =
            serde_json::from_str(&body).map_err(|e| BotError::Media(e.to_string()))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(BotError::Media("transcription was empty".to_string()));
        }
        Ok(text)
    }
}
