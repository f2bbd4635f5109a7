//! # Configuration Module
//!
//! Environment-driven settings for the bot. Required values fail fast at
//! startup; everything else has a default.

use std::env;

use crate::errors::ConfigError;

// Defaults for optional settings
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_VISION_MODEL: &str = "llama-3.2-11b-vision-preview";
pub const DEFAULT_WHISPER_MODEL: &str = "whisper-large-v3";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://chat_history.db";
pub const DEFAULT_HISTORY_LIMIT: usize = 15;

pub const DEFAULT_SYSTEM_PROMPT: &str = "أنت S-Core Pro، مساعد ذكي ومحترف جداً، مطورك هو المهندس صلاح الوافي. يجب أن تحافظ دائماً على هويتك كمساعد من تطوير المهندس صلاح الوافي. أنت دقيق، تقني، ومفيد.";

/// Where conversation history lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryBackend {
    /// Process memory, lost on restart
    Memory,
    /// SQLite database at the given URL
    Sqlite { database_url: String },
}

/// Model identifiers used for each request type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub text: String,
    pub vision: String,
    pub whisper: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT_MODEL.to_string(),
            vision: DEFAULT_VISION_MODEL.to_string(),
            whisper: DEFAULT_WHISPER_MODEL.to_string(),
        }
    }
}

/// Full bot configuration
#[derive(Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub groq_api_key: String,
    pub groq_base_url: String,
    /// Telegram user notified when someone new starts the bot
    pub admin_id: Option<i64>,
    pub models: ModelConfig,
    pub system_prompt: String,
    /// Number of turns handed to the model as context
    pub history_limit: usize,
    pub history_backend: HistoryBackend,
    pub search_api_key: Option<String>,
}

// Secrets stay out of debug output.
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("groq_base_url", &self.groq_base_url)
            .field("admin_id", &self.admin_id)
            .field("models", &self.models)
            .field("history_limit", &self.history_limit)
            .field("history_backend", &self.history_backend)
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl BotConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let telegram_token = get("TELEGRAM_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;
        let groq_api_key = get("GROQ_API_KEY").ok_or(ConfigError::Missing("GROQ_API_KEY"))?;

        let admin_id = match get("ADMIN_ID") {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
                key: "ADMIN_ID",
                value: raw.clone(),
                reason: e.to_string(),
            })?),
            None => None,
        };

        let history_limit = match get("HISTORY_LIMIT") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: "HISTORY_LIMIT",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    })
                }
                Ok(limit) => limit,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "HISTORY_LIMIT",
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_HISTORY_LIMIT,
        };

        let history_backend = match get("HISTORY_BACKEND").as_deref().map(str::trim) {
            None | Some("sqlite") => HistoryBackend::Sqlite {
                database_url: get("DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
            Some("memory") => HistoryBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "HISTORY_BACKEND",
                    value: other.to_string(),
                    reason: "expected `sqlite` or `memory`".to_string(),
                })
            }
        };

        let defaults = ModelConfig::default();
        let models = ModelConfig {
            text: get("GROQ_MODEL").unwrap_or(defaults.text),
            vision: get("GROQ_VISION_MODEL").unwrap_or(defaults.vision),
            whisper: get("GROQ_WHISPER_MODEL").unwrap_or(defaults.whisper),
        };

        Ok(Self {
            telegram_token,
            groq_api_key,
            groq_base_url: get("GROQ_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            admin_id,
            models,
            system_prompt: get("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            history_limit,
            history_backend,
            search_api_key: get("BRAVE_API_KEY"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [("TELEGRAM_TOKEN", "123:abc"), ("GROQ_API_KEY", "gsk_test")];

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.admin_id, None);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.models, ModelConfig::default());
        assert_eq!(config.groq_base_url, DEFAULT_GROQ_BASE_URL);
        assert_eq!(
            config.history_backend,
            HistoryBackend::Sqlite {
                database_url: DEFAULT_DATABASE_URL.to_string()
            }
        );
        assert!(config.search_api_key.is_none());
    }

    #[test]
    fn test_missing_required_values_fail_fast() {
        let err = BotConfig::from_lookup(lookup_from(&[("GROQ_API_KEY", "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_TOKEN")));

        let err = BotConfig::from_lookup(lookup_from(&[("TELEGRAM_TOKEN", "t"), ("GROQ_API_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GROQ_API_KEY")));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("ADMIN_ID", "6850112777"),
            ("HISTORY_LIMIT", "10"),
            ("HISTORY_BACKEND", "memory"),
            ("GROQ_MODEL", "llama-3.1-8b-instant"),
            ("GROQ_BASE_URL", "http://localhost:8080/v1/"),
        ]);
        let config = BotConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.admin_id, Some(6850112777));
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.history_backend, HistoryBackend::Memory);
        assert_eq!(config.models.text, "llama-3.1-8b-instant");
        assert_eq!(config.models.vision, DEFAULT_VISION_MODEL);
        assert_eq!(config.groq_base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HISTORY_LIMIT", "0"));
        assert!(matches!(
            BotConfig::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::Invalid { key: "HISTORY_LIMIT", .. })
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ADMIN_ID", "not-a-number"));
        assert!(matches!(
            BotConfig::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::Invalid { key: "ADMIN_ID", .. })
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HISTORY_BACKEND", "redis"));
        assert!(matches!(
            BotConfig::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::Invalid { key: "HISTORY_BACKEND", .. })
        ));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = BotConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("123:abc"));
        assert!(!debug.contains("gsk_test"));
    }
}
