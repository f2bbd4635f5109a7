use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use s_core::bot::{message_handler, BotState};
use s_core::chat::{ChatService, ChatSettings};
use s_core::config::{BotConfig, HistoryBackend};
use s_core::errors::BotError;
use s_core::conversation::{ConversationStore, MemoryStore, SqliteStore};
use s_core::groq::{CompletionClient, GroqClient};
use s_core::search::WebSearch;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting S-Core Telegram bot");

    let config = BotConfig::from_env()
        .map_err(BotError::from)
        .inspect_err(|e| error!(error = %e, kind = ?e.kind(), "Refusing to start"))?;
    info!(config = ?config, "Configuration loaded");

    let store: Arc<dyn ConversationStore> = match &config.history_backend {
        HistoryBackend::Memory => {
            info!(retention = config.history_limit, "Using in-memory history");
            Arc::new(MemoryStore::new(config.history_limit))
        }
        HistoryBackend::Sqlite { database_url } => {
            Arc::new(SqliteStore::connect(database_url).await?)
        }
    };

    let client: Arc<dyn CompletionClient> =
        Arc::new(GroqClient::new(&config.groq_api_key, &config.groq_base_url));

    let state = Arc::new(BotState::new(
        ChatService::new(store, client, ChatSettings::from(&config)),
        WebSearch::new(config.search_api_key.clone()),
        config.admin_id,
    ));

    let bot = Bot::new(&config.telegram_token);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry().branch(Update::filter_message().endpoint(message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
