//! Inbound interfaces: the HTTP server and the Telegram bot

pub mod bot;
pub mod http;
