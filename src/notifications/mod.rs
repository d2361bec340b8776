//! Notifications module
//!
//! Ledger changes are published on an in-process event bus. A background
//! task relays upload reports to the configured Telegram admin chat; the
//! uploader never waits for delivery.
//!
//! # Usage
//! ```ignore
//! use tollvault::notifications::{create_event_bus, spawn_upload_notifier, TelegramLink};
//!
//! let event_bus = create_event_bus();
//! let link = TelegramLink::new();
//! link.configure(&config.telegram).await;
//! spawn_upload_notifier(&event_bus, link, shutdown.signal());
//! ```

pub mod event_bus;
pub mod events;
pub mod messages;
pub mod telegram;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
pub use telegram::{notify_upload, spawn_upload_notifier, ActiveBot, NotifyError, TelegramLink};
