//! Add upload_date (batch date) to transactions
//!
//! Rows that predate the column are assigned today's date.

use chrono::Local;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;
use tracing::info;

use super::m20240101_000001_create_transactions::Transactions;

const UPLOAD_DATE_INDEX: &str = "idx_transactions_upload_date";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column("transactions", "upload_date").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Transactions::Table)
                        .add_column(ColumnDef::new(Transactions::UploadDate).text())
                        .to_owned(),
                )
                .await?;
            info!("Migration: added upload_date column");
        }

        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let backfill = Query::update()
            .table(Transactions::Table)
            .value(Transactions::UploadDate, today)
            .and_where(Expr::col(Transactions::UploadDate).is_null())
            .to_owned();
        let db = manager.get_connection();
        let result = db.execute(db.get_database_backend().build(&backfill)).await?;
        if result.rows_affected() > 0 {
            info!(
                "Migration: backfilled upload_date for {} existing rows",
                result.rows_affected()
            );
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(UPLOAD_DATE_INDEX)
                    .table(Transactions::Table)
                    .col(Transactions::UploadDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite cannot drop the column in place; only the index goes
        manager
            .drop_index(
                Index::drop()
                    .name(UPLOAD_DATE_INDEX)
                    .table(Transactions::Table)
                    .to_owned(),
            )
            .await
    }
}
