//! Bot module for handling Telegram interactions
//!
//! - `message_handler`: routes commands, text, voice, photo and document messages
//! - `ui_builder`: composes localized replies and splits long ones

pub mod message_handler;
pub mod ui_builder;

use crate::chat::ChatService;
use crate::search::WebSearch;

// Re-export main handler function for use in main.rs
pub use message_handler::message_handler;

/// Everything a handler needs, injected through the dispatcher
pub struct BotState {
    pub chat: ChatService,
    pub search: WebSearch,
    /// Telegram user notified about first contacts
    pub admin_id: Option<i64>,
}

impl BotState {
    pub fn new(chat: ChatService, search: WebSearch, admin_id: Option<i64>) -> Self {
        Self {
            chat,
            search,
            admin_id,
        }
    }
}
