//! Long-poll loop for the Telegram Bot API

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::handlers::{dispatch, BotContext};
use crate::infrastructure::telegram::LONG_POLL_SECS;
use crate::support::shutdown::ShutdownSignal;

/// How often to look for a bot while none is configured.
const IDLE_RECHECK: Duration = Duration::from_secs(5);

/// Back-off after a failed `getUpdates`.
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Sleep unless shutdown arrives first. Returns `false` on shutdown.
async fn pause(shutdown: &ShutdownSignal, delay: Duration) -> bool {
    tokio::select! {
        _ = shutdown.wait() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Spawn the poller. It follows settings changes: whenever the link holds a
/// different bot, polling restarts from that bot's pending updates.
pub fn spawn_bot_poller(ctx: Arc<BotContext>, shutdown: ShutdownSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut offset: i64 = 0;
        let mut polling_as: Option<String> = None;

        while !shutdown.is_triggered() {
            let Some(bot) = ctx.link.current().await else {
                polling_as = None;
                if !pause(&shutdown, IDLE_RECHECK).await {
                    break;
                }
                continue;
            };

            if polling_as.as_deref() != Some(bot.username.as_str()) {
                info!("🤖 Polling Telegram updates as @{}", bot.username);
                polling_as = Some(bot.username.clone());
                offset = 0;
            }

            let updates = tokio::select! {
                _ = shutdown.wait() => break,
                result = bot.client.get_updates(offset, LONG_POLL_SECS) => result,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(message) = update.message {
                            dispatch(&ctx, &bot, message).await;
                        }
                    }
                }
                Err(e) => {
                    warn!("getUpdates failed: {}", e);
                    if !pause(&shutdown, RETRY_DELAY).await {
                        break;
                    }
                }
            }
        }
        debug!("Telegram poller stopped");
    })
}
