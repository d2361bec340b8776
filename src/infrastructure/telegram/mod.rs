//! Telegram Bot API access

pub mod client;
pub mod types;

pub use client::{TelegramClient, TelegramError, LONG_POLL_SECS};
pub use types::{BotUser, Chat, Document, File, Message, Update};
