//! In-memory conversation store.
//!
//! Each user's turns live in a `VecDeque` trimmed to `retention` entries on
//! every append. The mutex is held for one operation at a time, so two
//! in-flight messages from the same user can still interleave between a
//! fetch and the following append; that ordering race is accepted.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ConversationStore, Turn};
use crate::errors::Result;

pub struct MemoryStore {
    conversations: Mutex<HashMap<i64, VecDeque<Turn>>>,
    retention: usize,
}

impl MemoryStore {
    /// Create a store keeping at most `retention` turns per user
    pub fn new(retention: usize) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            retention: retention.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, VecDeque<Turn>>> {
        // A panic mid-append leaves at worst one extra turn behind.
        self.conversations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn append(&self, turn: Turn) -> Result<()> {
        let mut conversations = self.lock();
        let turns = conversations.entry(turn.user_id).or_default();
        turns.push_back(turn);
        while turns.len() > self.retention {
            turns.pop_front();
        }
        Ok(())
    }

    async fn fetch(&self, user_id: i64, limit: usize) -> Result<Vec<Turn>> {
        let conversations = self.lock();
        let Some(turns) = conversations.get(&user_id) else {
            return Ok(Vec::new());
        };
        let skip = turns.len().saturating_sub(limit);
        Ok(turns.iter().skip(skip).cloned().collect())
    }

    async fn ensure(&self, user_id: i64) -> Result<bool> {
        let mut conversations = self.lock();
        if conversations.contains_key(&user_id) {
            return Ok(false);
        }
        conversations.insert(user_id, VecDeque::new());
        Ok(true)
    }
}
