#![allow(dead_code)]

//! Shared test doubles

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use s_core::chat::{ChatService, ChatSettings};
use s_core::config::ModelConfig;
use s_core::conversation::ConversationStore;
use s_core::errors::{BotError, Result};
use s_core::groq::CompletionClient;
use s_core::prompt::ChatMessage;

/// Scripted answer of the fake completion client
#[derive(Debug, Clone)]
pub enum Step {
    Text(String),
    /// Fails with an API error carrying this status
    Fail(u16),
}

/// Completion client answering from a script and recording every request
#[derive(Default)]
pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    pub requests: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    pub transcriptions: Mutex<Vec<(String, String, usize)>>,
}

impl ScriptedClient {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Step::Text(t.to_string())))
    }

    pub fn requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.requests.lock().unwrap().clone()
    }

    fn next_step(&self) -> Result<String> {
        match self.steps.lock().unwrap().pop_front() {
            Some(Step::Text(text)) => Ok(text),
            Some(Step::Fail(status)) => Err(BotError::Api {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Err(BotError::EmptyCompletion),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));
        self.next_step()
    }

    async fn transcribe(&self, model: &str, file_name: &str, audio: Vec<u8>) -> Result<String> {
        self.transcriptions
            .lock()
            .unwrap()
            .push((model.to_string(), file_name.to_string(), audio.len()));
        self.next_step()
    }
}

pub const SYSTEM_PROMPT: &str = "test system prompt";

pub fn settings(history_limit: usize) -> ChatSettings {
    ChatSettings {
        system_prompt: SYSTEM_PROMPT.to_string(),
        models: ModelConfig::default(),
        history_limit,
    }
}

pub fn service(
    store: Arc<dyn ConversationStore>,
    client: Arc<ScriptedClient>,
    history_limit: usize,
) -> ChatService {
    ChatService::new(store, client, settings(history_limit))
}

pub async fn sqlite_store() -> (Arc<dyn ConversationStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("history.db").display());
    let store = s_core::conversation::SqliteStore::connect(&url).await.unwrap();
    (Arc::new(store), dir)
}
