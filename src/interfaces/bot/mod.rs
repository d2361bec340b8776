//! Telegram bot interface
//!
//! Accepts CSV documents and the `/start`, `/status`, `/today` and
//! `/backup` commands from the admin chat.

pub mod handlers;
pub mod poller;

pub use handlers::{BotContext, Reply};
pub use poller::spawn_bot_poller;
