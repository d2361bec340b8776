//! Telegram link and upload notifier
//!
//! The link holds the currently configured bot, if any. It is swapped when
//! settings change; readers take a cheap clone of the active bot.

use std::sync::Arc;

use chrono::Local;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event_bus::SharedEventBus;
use super::events::{Event, EventMessage};
use super::messages;
use crate::config::TelegramConfig;
use crate::domain::UploadSummary;
use crate::infrastructure::telegram::{TelegramClient, TelegramError};
use crate::support::shutdown::ShutdownSignal;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to deliver upload report: {0}")]
    Delivery(#[from] TelegramError),
}

/// A bot that answered `getMe` with its current token.
#[derive(Clone)]
pub struct ActiveBot {
    pub client: TelegramClient,
    pub admin_chat_id: i64,
    pub username: String,
}

impl ActiveBot {
    /// Any chat is allowed while no admin chat is configured.
    pub fn authorizes(&self, chat_id: i64) -> bool {
        self.admin_chat_id == 0 || self.admin_chat_id == chat_id
    }

    /// Chat receiving upload reports.
    pub fn report_chat(&self) -> Option<i64> {
        (self.admin_chat_id != 0).then_some(self.admin_chat_id)
    }
}

#[derive(Clone, Default)]
pub struct TelegramLink {
    active: Arc<RwLock<Option<ActiveBot>>>,
}

impl TelegramLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<ActiveBot> {
        self.active.read().await.clone()
    }

    pub async fn install(&self, bot: Option<ActiveBot>) {
        *self.active.write().await = bot;
    }

    /// (Re)connect with new settings. A bad token leaves the bot disabled.
    ///
    /// Returns the bot's username when it is active.
    pub async fn configure(&self, config: &TelegramConfig) -> Option<String> {
        if !config.is_enabled() {
            info!("Telegram bot disabled (no token configured)");
            self.install(None).await;
            return None;
        }

        let bot = match connect(config).await {
            Ok(bot) => bot,
            Err(e) => {
                warn!("Telegram bot init error: {}", e);
                self.install(None).await;
                return None;
            }
        };

        info!("Telegram bot: @{}", bot.username);
        let username = bot.username.clone();
        self.install(Some(bot)).await;
        Some(username)
    }
}

async fn connect(config: &TelegramConfig) -> Result<ActiveBot, TelegramError> {
    let client = TelegramClient::new(config.token.trim())?;
    let me = client.get_me().await?;
    Ok(ActiveBot {
        client,
        admin_chat_id: config.admin_chat_id,
        username: me.username.unwrap_or(me.first_name),
    })
}

/// Post an upload report to the admin chat.
///
/// Returns `false` when no bot or no admin chat is configured.
pub async fn notify_upload(link: &TelegramLink, summary: &UploadSummary) -> Result<bool, NotifyError> {
    let Some(bot) = link.current().await else {
        return Ok(false);
    };
    let Some(chat_id) = bot.report_chat() else {
        return Ok(false);
    };

    let text = messages::upload_report(summary, &Local::now());
    bot.client.send_markdown(chat_id, &text).await?;
    Ok(true)
}

async fn handle_event(link: &TelegramLink, message: EventMessage) {
    match message.event {
        Event::UploadProcessed(e) => match notify_upload(link, &e.summary).await {
            Ok(true) => debug!("Upload report {} delivered", message.id),
            Ok(false) => debug!("Upload report {} skipped, no admin chat", message.id),
            Err(e) => warn!("{}", e),
        },
        Event::BatchCleared(e) => {
            debug!("Batch {} cleared ({} rows)", e.batch_date, e.rows);
        }
    }
}

/// Spawn the task that turns bus events into chat notifications.
pub fn spawn_upload_notifier(
    event_bus: &SharedEventBus,
    link: TelegramLink,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    let mut subscriber = event_bus.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                received = subscriber.recv() => match received {
                    Some(message) => handle_event(&link, message).await,
                    None => break,
                },
            }
        }
        debug!("Upload notifier stopped");
    })
}
