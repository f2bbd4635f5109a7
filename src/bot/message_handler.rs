//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, FileId};
use tracing::{debug, error, info, warn};

use super::ui_builder::{
    format_admin_alert, format_help, format_pdf_summary, format_welcome, split_message,
};
use super::BotState;
use crate::errors::BotError;
use crate::localization::{t_args_lang, t_lang};
use crate::media;
use crate::search::{augment_with_results, parse_search_request};

/// Download a Telegram file into memory
pub async fn download_file(bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url).await?.error_for_status()?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

/// Send `text`, split into as many messages as Telegram needs
async fn send_reply(bot: &Bot, chat_id: ChatId, text: &str) -> crate::errors::Result<()> {
    for chunk in split_message(text) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// Text sent back for a chat answer: the model's reply, or the localized
/// apology when it failed
pub fn reply_text(
    answer: std::result::Result<String, BotError>,
    language_code: Option<&str>,
) -> String {
    match answer {
        Ok(reply) => reply,
        Err(e) => {
            debug!(error = %e, kind = ?e.kind(), "Answering with apology");
            t_lang("chat-error", language_code)
        }
    }
}

async fn show_typing(bot: &Bot, chat_id: ChatId) {
    if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
        debug!(chat_id = %chat_id, error = %e, "Failed to send typing indicator");
    }
}

fn sender_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .and_then(|user| i64::try_from(user.id.0).ok())
        .unwrap_or(msg.chat.id.0)
}

fn sender_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

/// Tell the administrator about a first contact. Best-effort.
async fn notify_admin(bot: &Bot, state: &BotState, msg: &Message) {
    let (Some(admin_id), Some(user)) = (state.admin_id, msg.from.as_ref()) else {
        return;
    };

    let alert = format_admin_alert(&user.full_name(), user.username.as_deref(), sender_id(msg));
    match bot.send_message(ChatId(admin_id), alert).await {
        Ok(_) => info!(user_id = sender_id(msg), "Administrator notified about new user"),
        Err(e) => warn!(error = %e, "Failed to send administrator alert"),
    }
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    command: &str,
) -> Result<()> {
    let language_code = sender_language(msg);

    // "/start@SomeBot payload" -> "/start"
    let name = command
        .split_whitespace()
        .next()
        .and_then(|word| word.split('@').next())
        .unwrap_or_default();

    match name {
        "/start" => {
            let (_, created) = state.chat.open(sender_id(msg)).await;
            let first_name = msg
                .from
                .as_ref()
                .map(|user| user.first_name.as_str())
                .unwrap_or_default();
            bot.send_message(msg.chat.id, format_welcome(first_name, language_code))
                .await?;
            if created {
                notify_admin(bot, state, msg).await;
            }
        }
        "/help" => {
            bot.send_message(msg.chat.id, format_help(language_code))
                .await?;
        }
        other => debug!(user_id = sender_id(msg), command = %other, "Ignoring unknown command"),
    }
    Ok(())
}

/// Answer user text through the chat service, running a web search first
/// when the text asks for one
async fn answer_text(bot: &Bot, msg: &Message, state: &BotState, text: &str) -> Result<()> {
    let chat_id = msg.chat.id;
    let user_id = sender_id(msg);
    let language_code = sender_language(msg);

    let user_input = match parse_search_request(text) {
        Some(query) => {
            bot.send_message(
                chat_id,
                t_args_lang("search-progress", &[("query", query)], language_code),
            )
            .await?;

            let results = match state.search.search(query).await {
                Ok(results) if !results.trim().is_empty() => results,
                Ok(_) => {
                    warn!(user_id, query = %query, "Web search returned no results");
                    t_lang("search-unavailable", language_code)
                }
                Err(e) => {
                    error!(user_id, error = %e, "Web search failed");
                    t_lang("search-unavailable", language_code)
                }
            };
            augment_with_results(query, &results)
        }
        None => text.to_string(),
    };

    show_typing(bot, chat_id).await;
    let answer = state.chat.respond(user_id, &user_input).await;
    send_reply(bot, chat_id, &reply_text(answer, language_code)).await?;
    Ok(())
}

async fn handle_text_message(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    debug!(user_id = sender_id(msg), message_length = text.len(), "Received text message from user");

    if text.starts_with('/') {
        return handle_command(bot, msg, state, text).await;
    }
    answer_text(bot, msg, state, text).await
}

async fn handle_voice_message(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let Some(voice) = msg.voice() else {
        return Ok(());
    };
    let user_id = sender_id(msg);
    let language_code = sender_language(msg);
    debug!(user_id, duration = ?voice.duration, "Received voice message from user");

    let transcription = match download_file(bot, voice.file.id.clone()).await {
        Ok(audio) => state.chat.transcribe_voice(user_id, audio).await.map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };

    match transcription {
        Ok(text) => {
            bot.send_message(
                msg.chat.id,
                t_args_lang("voice-heard", &[("text", text.as_str())], language_code),
            )
            .await?;
            answer_text(bot, msg, state, &text).await
        }
        Err(e) => {
            error!(user_id, error = %e, "Voice message processing failed");
            bot.send_message(msg.chat.id, t_lang("voice-error", language_code))
                .await?;
            Ok(())
        }
    }
}

async fn handle_photo_message(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) else {
        return Ok(());
    };
    let user_id = sender_id(msg);
    let language_code = sender_language(msg);
    debug!(user_id, "Received photo message from user");

    show_typing(bot, msg.chat.id).await;
    let description = match download_file(bot, largest_photo.file.id.clone()).await {
        Ok(image) => state
            .chat
            .describe_image(msg.caption(), &image)
            .await
            .map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };

    match description {
        Ok(description) => send_reply(bot, msg.chat.id, &description).await?,
        Err(e) => {
            error!(user_id, error = %e, "Photo analysis failed");
            bot.send_message(msg.chat.id, t_lang("vision-error", language_code))
                .await?;
        }
    }
    Ok(())
}

fn is_pdf(document: &teloxide::types::Document) -> bool {
    match &document.mime_type {
        Some(mime_type) => mime_type.essence_str() == "application/pdf",
        None => document
            .file_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().ends_with(".pdf")),
    }
}

async fn summarize_pdf(bot: &Bot, state: &BotState, file_id: FileId) -> Result<String> {
    let bytes = download_file(bot, file_id).await?;
    // pdf-extract can panic on malformed files; keep that off the async workers.
    let text = tokio::task::spawn_blocking(move || media::extract_pdf_text(&bytes)).await??;
    Ok(state.chat.summarize_document(&text).await?)
}

async fn handle_document_message(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let Some(doc) = msg.document() else {
        return Ok(());
    };
    let user_id = sender_id(msg);
    let language_code = sender_language(msg);

    if !is_pdf(doc) {
        debug!(user_id, mime_type = ?doc.mime_type, "Received non-PDF document from user");
        bot.send_message(msg.chat.id, t_lang("document-unsupported", language_code))
            .await?;
        return Ok(());
    }

    debug!(user_id, file_size = doc.file.size, "Received PDF document from user");
    bot.send_message(msg.chat.id, t_lang("pdf-reading", language_code))
        .await?;
    show_typing(bot, msg.chat.id).await;

    match summarize_pdf(bot, state, doc.file.id.clone()).await {
        Ok(summary) => {
            send_reply(bot, msg.chat.id, &format_pdf_summary(&summary, language_code)).await?
        }
        Err(e) => {
            error!(user_id, error = %e, "PDF processing failed");
            bot.send_message(msg.chat.id, t_lang("pdf-error", language_code))
                .await?;
        }
    }
    Ok(())
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    debug!(user_id = sender_id(msg), "Received unsupported message type from user");
    bot.send_message(
        msg.chat.id,
        t_lang("unsupported-message", sender_language(msg)),
    )
    .await?;
    Ok(())
}

pub async fn message_handler(bot: Bot, msg: Message, state: Arc<BotState>) -> Result<()> {
    if msg.text().is_some() {
        handle_text_message(&bot, &msg, &state).await?;
    } else if msg.voice().is_some() {
        handle_voice_message(&bot, &msg, &state).await?;
    } else if msg.photo().is_some() {
        handle_photo_message(&bot, &msg, &state).await?;
    } else if msg.document().is_some() {
        handle_document_message(&bot, &msg, &state).await?;
    } else {
        handle_unsupported_message(&bot, &msg).await?;
    }

    Ok(())
}
