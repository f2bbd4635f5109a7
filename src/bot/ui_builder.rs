//! UI Builder module for composing localized replies

use crate::localization::{t_args_lang, t_lang};

/// Telegram rejects messages above 4096 UTF-16 code units; keep some headroom
pub const MAX_MESSAGE_UNITS: usize = 4000;

/// Length of `text` the way Telegram counts it
pub fn telegram_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Greeting sent on /start
pub fn format_welcome(first_name: &str, language_code: Option<&str>) -> String {
    t_args_lang("welcome", &[("name", first_name)], language_code)
}

/// Feature overview sent on /help
pub fn format_help(language_code: Option<&str>) -> String {
    [
        "help-title",
        "help-text",
        "help-search",
        "help-voice",
        "help-photo",
        "help-pdf",
    ]
    .iter()
    .map(|key| t_lang(key, language_code))
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Administrator alert about a user starting the bot for the first time
pub fn format_admin_alert(full_name: &str, username: Option<&str>, user_id: i64) -> String {
    let id = user_id.to_string();
    [
        t_lang("admin-new-user-title", None),
        String::new(),
        t_args_lang("admin-new-user-name", &[("name", full_name)], None),
        t_args_lang(
            "admin-new-user-username",
            &[("username", username.unwrap_or("-"))],
            None,
        ),
        t_args_lang("admin-new-user-id", &[("id", id.as_str())], None),
    ]
    .join("\n")
}

pub fn format_pdf_summary(summary: &str, language_code: Option<&str>) -> String {
    format!("{}\n\n{}", t_lang("pdf-summary-title", language_code), summary)
}

/// Split `text` into chunks Telegram accepts, preferring line breaks
pub fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_units = 0;

    for line in text.split_inclusive('\n') {
        let line_units = telegram_len(line);
        if current_units + line_units > MAX_MESSAGE_UNITS && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_units = 0;
        }

        if line_units > MAX_MESSAGE_UNITS {
            // One oversized line: hard cut on char boundaries.
            let mut piece = String::new();
            let mut piece_units = 0;
            for c in line.chars() {
                if piece_units + c.len_utf16() > MAX_MESSAGE_UNITS {
                    chunks.push(std::mem::take(&mut piece));
                    piece_units = 0;
                }
                piece.push(c);
                piece_units += c.len_utf16();
            }
            if !piece.is_empty() {
                chunks.push(piece);
            }
            continue;
        }

        current.push_str(line);
        current_units += line_units;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
