//! Infrastructure layer - external concerns

pub mod browser;
pub mod database;
pub mod storage;
pub mod telegram;

pub use database::{init_database, open_ledger_store, DatabaseConfig, SeaOrmLedgerRepository};
pub use storage::UploadArchive;
pub use telegram::TelegramClient;
