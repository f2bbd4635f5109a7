//! Chat service: runs one message through history, prompt assembly and the
//! completion client. Knows nothing about Telegram.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{BotConfig, ModelConfig};
use crate::conversation::{get_or_create, Conversation, ConversationStore, Role, Turn};
use crate::errors::Result;
use crate::groq::CompletionClient;
use crate::media;
use crate::prompt::{self, ChatMessage};

/// Settings the chat service needs from the bot configuration
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub models: ModelConfig,
    /// Maximum number of turns in a prompt, the new one included
    pub history_limit: usize,
}

impl From<&BotConfig> for ChatSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            models: config.models.clone(),
            history_limit: config.history_limit,
        }
    }
}

pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    client: Arc<dyn CompletionClient>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        client: Arc<dyn CompletionClient>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            store,
            client,
            settings,
        }
    }

    /// Conversation of `user_id` and whether this is the first contact
    pub async fn open(&self, user_id: i64) -> (Conversation, bool) {
        get_or_create(&self.store, user_id).await
    }

    /// Answer a text message using the user's recent history.
    ///
    /// The user turn is stored whatever happens; the assistant turn only when
    /// the model answered.
    pub async fn respond(&self, user_id: i64, text: &str) -> Result<String> {
        let (conversation, _) = self.open(user_id).await;

        let history = conversation
            .history(self.settings.history_limit.saturating_sub(1))
            .await;
        conversation.record(Role::User, text).await;

        let new_turn = Turn::new(user_id, Role::User, text);
        let messages = prompt::build(&self.settings.system_prompt, &history, &new_turn);

        match self.client.complete(&self.settings.models.text, &messages).await {
            Ok(reply) => {
                conversation.record(Role::Assistant, &reply).await;
                info!(
                    user_id,
                    history_turns = history.len(),
                    reply_chars = reply.chars().count(),
                    "Chat completion delivered"
                );
                Ok(reply)
            }
            Err(e) => {
                error!(user_id, error = %e, retryable = e.is_retryable(), "Chat completion failed");
                Err(e)
            }
        }
    }

    /// Describe an image with the vision model. Never touches history.
    pub async fn describe_image(&self, caption: Option<&str>, image: &[u8]) -> Result<String> {
        let caption = caption
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(media::DEFAULT_IMAGE_PROMPT);
        let messages = prompt::build_vision(
            &self.settings.system_prompt,
            caption,
            &media::image_data_url(image),
        );

        self.client
            .complete(&self.settings.models.vision, &messages)
            .await
            .inspect_err(|e| error!(error = %e, "Vision request failed"))
    }

    /// Summarize extracted document text. Never touches history.
    pub async fn summarize_document(&self, text: &str) -> Result<String> {
        let messages = vec![
            ChatMessage::system(&self.settings.system_prompt),
            ChatMessage::user(media::summary_request(text)),
        ];

        self.client
            .complete(&self.settings.models.text, &messages)
            .await
            .inspect_err(|e| error!(error = %e, "Document summary failed"))
    }

    /// Transcribe a Telegram voice note (OGG/Opus, accepted as is by Whisper)
    pub async fn transcribe_voice(&self, user_id: i64, audio: Vec<u8>) -> Result<String> {
        let file_name = format!("voice_{user_id}.ogg");
        self.client
            .transcribe(&self.settings.models.whisper, &file_name, audio)
            .await
            .inspect_err(|e| error!(user_id, error = %e, "Voice transcription failed"))
    }
}
