pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::SeaOrmLedgerRepository;

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use migrator::Migrator;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./data.db?mode=rwc")
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data.db?mode=rwc".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
        }
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);
    let db = Database::connect(&config.url).await?;
    info!("Database connected successfully");
    Ok(db)
}

/// Connect and bring the schema up to date. Stores written by older
/// versions are upgraded in place.
pub async fn open_ledger_store(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let db = init_database(config).await?;
    info!("Running database migrations...");
    Migrator::up(&db, None).await?;
    info!("Migrations completed");
    Ok(db)
}
