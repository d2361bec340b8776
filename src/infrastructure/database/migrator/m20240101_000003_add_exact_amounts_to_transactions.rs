//! Add exact decimal amount columns to transactions
//!
//! Amounts are kept as canonical decimal text so nothing is lost to REAL
//! rounding. Existing rows are backfilled from the REAL columns.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;
use tracing::info;

use super::m20240101_000001_create_transactions::Transactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (column, name) in [
            (Transactions::AmountExact, "amount_exact"),
            (Transactions::GstExact, "gst_exact"),
        ] {
            if manager.has_column("transactions", name).await? {
                continue;
            }
            manager
                .alter_table(
                    Table::alter()
                        .table(Transactions::Table)
                        .add_column(ColumnDef::new(column).text().not_null().default("0"))
                        .to_owned(),
                )
                .await?;
            info!("Migration: added {} column", name);
        }

        let backfill = Query::update()
            .table(Transactions::Table)
            .value(
                Transactions::AmountExact,
                Expr::cust("CAST(COALESCE(total_amount_charged, 0) AS TEXT)"),
            )
            .value(
                Transactions::GstExact,
                Expr::cust("CAST(COALESCE(gst_amount, 0) AS TEXT)"),
            )
            .to_owned();
        let db = manager.get_connection();
        db.execute(db.get_database_backend().build(&backfill)).await?;
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite doesn't support DROP COLUMN on older versions; the columns stay
        Ok(())
    }
}
