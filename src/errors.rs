//! # Error Types Module
//!
//! Structured errors for the chat pipeline. Each variant belongs to one
//! [`ErrorKind`] so callers can tell configuration mistakes apart from
//! transport hiccups and from content that could not be processed.

use thiserror::Error;

/// Missing or malformed environment configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} must be set")]
    Missing(&'static str),
    /// A variable is set but cannot be used
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Coarse classification of a [`BotError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Content,
}

/// Errors raised while serving a single message
#[derive(Debug, Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Network failure talking to an HTTP endpoint
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Endpoint answered with a non-success status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    /// Completion response carried no choices or no content
    #[error("completion response contained no text")]
    EmptyCompletion,
    /// Audio, image or PDF payload could not be processed
    #[error("media processing error: {0}")]
    Media(String),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Config(_) => ErrorKind::Configuration,
            BotError::Transport(_) | BotError::Telegram(_) | BotError::Storage(_) => {
                ErrorKind::Transport
            }
            BotError::Api { status, .. } if *status == 429 || *status >= 500 => {
                ErrorKind::Transport
            }
            BotError::Api { .. } | BotError::EmptyCompletion | BotError::Media(_) => {
                ErrorKind::Content
            }
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    /// Nothing in the bot retries today.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = BotError::Api {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): invalid api key");

        let err = BotError::from(ConfigError::Missing("GROQ_API_KEY"));
        assert_eq!(
            err.to_string(),
            "configuration error: GROQ_API_KEY must be set"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BotError::from(ConfigError::Missing("TELEGRAM_TOKEN")).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(BotError::Media("bad pdf".into()).kind(), ErrorKind::Content);
        assert_eq!(BotError::EmptyCompletion.kind(), ErrorKind::Content);

        let throttled = BotError::Api {
            status: 429,
            body: String::new(),
        };
        assert_eq!(throttled.kind(), ErrorKind::Transport);
        assert!(throttled.is_retryable());

        let rejected = BotError::Api {
            status: 400,
            body: String::new(),
        };
        assert!(!rejected.is_retryable());

        let blocked = BotError::from(teloxide::RequestError::Api(teloxide::ApiError::BotBlocked));
        assert_eq!(blocked.kind(), ErrorKind::Transport);
    }
}
