//! Create transactions table
//!
//! Same shape as stores written by the first release, so that `if_not_exists`
//! leaves such a table untouched and the following migrations upgrade it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transactions::EnrolmentNoDate)
                            .text()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Transactions::TotalAmountCharged).double())
                    .col(ColumnDef::new(Transactions::GstAmount).double())
                    .col(ColumnDef::new(Transactions::OperatorId).text())
                    .col(ColumnDef::new(Transactions::ResidentName).text())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Transactions {
    Table,
    Id,
    EnrolmentNoDate,
    TotalAmountCharged,
    GstAmount,
    OperatorId,
    ResidentName,
    UploadDate,
    AmountExact,
    GstExact,
}
