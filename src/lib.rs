//! # TollVault
//!
//! Toll-collection analytics: daily CSV exports are decoded into a SQLite
//! ledger, deduplicated by enrolment key, and summarized into revenue, GST
//! and fare-slab counts over the web dashboard, a JSON API and a Telegram bot.
//!
//! ## Architecture
//!
//! - **domain**: money, transactions, aggregates and the ledger repository trait
//! - **application**: CSV ingestion and report use-cases
//! - **infrastructure**: SQLite via SeaORM, upload archive, Telegram Bot API client
//! - **interfaces**: HTTP server (dashboard, REST, Swagger) and the Telegram bot
//! - **notifications**: in-process event bus and chat notifications
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod server;
pub mod support;

pub use config::{default_config_path, AppConfig, SharedConfig};

pub use infrastructure::{init_database, open_ledger_store, DatabaseConfig};

pub use interfaces::http::create_router;

pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
