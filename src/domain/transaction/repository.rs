//! Ledger repository interface

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{ClearedBatch, TollTransaction};
use crate::domain::money::Money;
use crate::domain::report::{DateRange, Period, PeriodRow};
use crate::domain::DomainResult;

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Store a transaction unless its key is already present.
    /// Returns whether a row was added; a duplicate key is not an error.
    async fn insert_if_absent(&self, transaction: &TollTransaction) -> DomainResult<bool>;

    /// `(amount, gst)` of every row whose batch date lies in `range`.
    async fn scan(&self, range: DateRange) -> DomainResult<Vec<(Money, Money)>>;

    /// Totals per calendar period, most recent period first.
    async fn group_by_period(&self, period: Period, range: DateRange)
        -> DomainResult<Vec<PeriodRow>>;

    /// Delete every row of the most recent batch date. `None` if the store is empty.
    async fn delete_latest_batch(&self) -> DomainResult<Option<ClearedBatch>>;

    async fn min_max_dates(&self) -> DomainResult<(Option<NaiveDate>, Option<NaiveDate>)>;

    async fn count(&self) -> DomainResult<u64>;

    async fn scan_all(&self) -> DomainResult<Vec<(Money, Money)>> {
        self.scan(DateRange::all()).await
    }

    async fn scan_filtered(&self, range: DateRange) -> DomainResult<Vec<(Money, Money)>> {
        self.scan(range).await
    }
}
