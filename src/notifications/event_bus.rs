//! In-process fan-out of ledger events
//!
//! Publishing never blocks the uploader. A slow listener skips ahead to the
//! oldest event still buffered instead of holding the channel back.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::broadcast;

use super::events::{Event, EventMessage};

/// Uploads arrive minutes apart; a few dozen pending reports is plenty.
const BACKLOG: usize = 64;

pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::bounded(BACKLOG)
    }

    fn bounded(backlog: usize) -> Self {
        let (sender, _) = broadcast::channel(backlog);
        Self { sender }
    }

    /// Wrap and broadcast `event`. Returns how many listeners got it; zero
    /// when no notifier is running (Telegram not configured).
    pub fn publish(&self, event: Event) -> usize {
        let message = EventMessage::new(event);
        let label = format!("{} for {}", message.event.event_type(), message.event.batch_date());

        let delivered = self.sender.send(message).unwrap_or(0);
        debug!("Ledger event {} reached {} listener(s)", label, delivered);
        delivered
    }

    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
}

impl EventSubscriber {
    /// Next event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Notifier fell behind; {} upload report(s) dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
