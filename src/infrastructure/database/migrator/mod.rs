//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_transactions;
mod m20240101_000002_add_upload_date_to_transactions;
mod m20240101_000003_add_exact_amounts_to_transactions;

pub use m20240101_000001_create_transactions::Transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_transactions::Migration),
            Box::new(m20240101_000002_add_upload_date_to_transactions::Migration),
            Box::new(m20240101_000003_add_exact_amounts_to_transactions::Migration),
        ]
    }
}
