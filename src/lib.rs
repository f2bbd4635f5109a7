//! # S-Core Telegram Bot
//!
//! A Telegram assistant that forwards text, voice, photo and PDF messages to
//! Groq's language models and keeps a short rolling history per user.

pub mod bot;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod groq;
pub mod localization;
pub mod media;
pub mod prompt;
pub mod search;
