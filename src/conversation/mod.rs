//! Per-user conversation history
//!
//! - `memory`: in-process store, lost on restart
//! - `sqlite`: durable store backed by a `history` table of turns
//!
//! Both implement [`ConversationStore`]. Handlers never talk to a store
//! directly; they go through the [`Conversation`] handle returned by
//! [`get_or_create`], which logs and swallows storage failures.

pub mod memory;
pub mod sqlite;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// One stored exchange unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user_id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(user_id: i64, role: Role, content: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Storage contract shared by the memory and SQLite backends
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append a turn to its owner's conversation
    async fn append(&self, turn: Turn) -> Result<()>;

    /// The most recent `limit` turns of `user_id`, oldest first
    async fn fetch(&self, user_id: i64, limit: usize) -> Result<Vec<Turn>>;

    /// Make sure a conversation exists for `user_id`.
    /// Returns `true` when this call created it.
    async fn ensure(&self, user_id: i64) -> Result<bool>;
}

/// Owned handle on one user's conversation
#[derive(Clone)]
pub struct Conversation {
    user_id: i64,
    store: Arc<dyn ConversationStore>,
}

impl Conversation {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Store a turn. Failures are logged, never surfaced.
    pub async fn record(&self, role: Role, content: &str) {
        let turn = Turn::new(self.user_id, role, content);
        match self.store.append(turn).await {
            Ok(()) => debug!(user_id = self.user_id, role = %role, "Turn recorded"),
            Err(e) => {
                error!(user_id = self.user_id, role = %role, error = %e, "Failed to record turn")
            }
        }
    }

    /// The last `limit` turns, or nothing if the store is unavailable
    pub async fn history(&self, limit: usize) -> Vec<Turn> {
        match self.store.fetch(self.user_id, limit).await {
            Ok(turns) => turns,
            Err(e) => {
                error!(user_id = self.user_id, error = %e, "Failed to load history");
                Vec::new()
            }
        }
    }
}

/// Get the conversation of `user_id`, creating it on first contact.
///
/// The flag is `true` when the conversation did not exist before.
pub async fn get_or_create(store: &Arc<dyn ConversationStore>, user_id: i64) -> (Conversation, bool) {
    let created = match store.ensure(user_id).await {
        Ok(created) => created,
        Err(e) => {
            error!(user_id, error = %e, "Failed to check conversation existence");
            false
        }
    };

    let conversation = Conversation {
        user_id,
        store: Arc::clone(store),
    };
    (conversation, created)
}
