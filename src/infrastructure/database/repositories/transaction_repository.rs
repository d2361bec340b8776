//! SeaORM implementation of LedgerRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Select, Set, TransactionTrait,
};

use crate::domain::{
    group_into_periods, ClearedBatch, DateRange, DomainError, DomainResult, LedgerRepository,
    Money, Period, PeriodRow, TollTransaction,
};
use crate::infrastructure::database::entities::transaction;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SeaOrmLedgerRepository {
    db: DatabaseConnection,
}

impl SeaOrmLedgerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn date_to_column(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn column_to_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn column_to_money(raw: &str) -> Money {
    Money::parse_lenient(raw)
}

fn within(query: Select<transaction::Entity>, range: DateRange) -> Select<transaction::Entity> {
    let mut query = query;
    if let Some(from) = range.from {
        query = query.filter(transaction::Column::UploadDate.gte(date_to_column(from)));
    }
    if let Some(to) = range.to {
        query = query.filter(transaction::Column::UploadDate.lte(date_to_column(to)));
    }
    query
}

fn to_active_model(tx: &TollTransaction) -> transaction::ActiveModel {
    transaction::ActiveModel {
        id: NotSet,
        enrolment_no_date: Set(tx.enrolment_key.clone()),
        total_amount_charged: Set(Some(tx.amount_charged.as_f64())),
        gst_amount: Set(Some(tx.gst_amount.as_f64())),
        operator_id: Set(Some(tx.operator_id.clone())),
        resident_name: Set(Some(tx.resident_name.clone())),
        upload_date: Set(Some(date_to_column(tx.upload_batch_date))),
        amount_exact: Set(tx.amount_charged.to_storage()),
        gst_exact: Set(tx.gst_amount.to_storage()),
    }
}

// ── LedgerRepository impl ───────────────────────────────────────

#[async_trait]
impl LedgerRepository for SeaOrmLedgerRepository {
    async fn insert_if_absent(&self, tx: &TollTransaction) -> DomainResult<bool> {
        let affected = transaction::Entity::insert(to_active_model(tx))
            .on_conflict(
                OnConflict::column(transaction::Column::EnrolmentNoDate)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if affected == 0 {
            debug!("Skipping duplicate enrolment key: {}", tx.enrolment_key);
        }
        Ok(affected > 0)
    }

    async fn scan(&self, range: DateRange) -> DomainResult<Vec<(Money, Money)>> {
        let rows: Vec<(String, String)> = within(transaction::Entity::find(), range)
            .select_only()
            .column(transaction::Column::AmountExact)
            .column(transaction::Column::GstExact)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .iter()
            .map(|(amount, gst)| (column_to_money(amount), column_to_money(gst)))
            .collect())
    }

    async fn group_by_period(
        &self,
        period: Period,
        range: DateRange,
    ) -> DomainResult<Vec<PeriodRow>> {
        // One tally per (date, amount, gst); a day has only a handful of fares
        let tallies: Vec<(Option<String>, String, String, i64)> =
            within(transaction::Entity::find(), range)
                .select_only()
                .column(transaction::Column::UploadDate)
                .column(transaction::Column::AmountExact)
                .column(transaction::Column::GstExact)
                .column_as(Expr::col(transaction::Column::Id).count(), "tally")
                .group_by(transaction::Column::UploadDate)
                .group_by(transaction::Column::AmountExact)
                .group_by(transaction::Column::GstExact)
                .into_tuple()
                .all(&self.db)
                .await?;

        let mut dated = Vec::with_capacity(tallies.len());
        for (raw, amount, gst, rows) in tallies {
            match raw.as_deref().and_then(column_to_date) {
                Some(date) => dated.push((
                    date,
                    column_to_money(&amount),
                    column_to_money(&gst),
                    u64::try_from(rows).unwrap_or(0),
                )),
                None => warn!("Skipping {} rows with unreadable upload_date {:?}", rows, raw),
            }
        }

        Ok(group_into_periods(period, dated))
    }

    async fn delete_latest_batch(&self) -> DomainResult<Option<ClearedBatch>> {
        let txn = self.db.begin().await?;

        let latest: Option<Option<String>> = transaction::Entity::find()
            .select_only()
            .column_as(Expr::col(transaction::Column::UploadDate).max(), "max_date")
            .into_tuple()
            .one(&txn)
            .await?;

        let Some(raw) = latest.flatten() else {
            txn.commit().await?;
            return Ok(None);
        };
        let batch_date = column_to_date(&raw).ok_or_else(|| {
            DomainError::Storage(format!("unreadable upload_date {:?}", raw))
        })?;

        let result = transaction::Entity::delete_many()
            .filter(transaction::Column::UploadDate.eq(raw))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            "Cleared last upload ({}): {} rows",
            batch_date, result.rows_affected
        );
        Ok(Some(ClearedBatch {
            batch_date,
            rows: result.rows_affected,
        }))
    }

    async fn min_max_dates(&self) -> DomainResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        let row: Option<(Option<String>, Option<String>)> = transaction::Entity::find()
            .select_only()
            .column_as(Expr::col(transaction::Column::UploadDate).min(), "min_date")
            .column_as(Expr::col(transaction::Column::UploadDate).max(), "max_date")
            .into_tuple()
            .one(&self.db)
            .await?;

        let (min, max) = row.unwrap_or((None, None));
        Ok((
            min.as_deref().and_then(column_to_date),
            max.as_deref().and_then(column_to_date),
        ))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(transaction::Entity::find().count(&self.db).await?)
    }
}
