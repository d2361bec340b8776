//! Read-side queries over the ledger

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{
    aggregate, Aggregate, DateRange, DomainResult, LedgerRepository, Period, PeriodRow,
};

/// Revenue, GST and slab reports for the dashboard, the JSON API and the bot.
#[derive(Clone)]
pub struct ReportService {
    ledger: Arc<dyn LedgerRepository>,
}

impl ReportService {
    pub fn new(ledger: Arc<dyn LedgerRepository>) -> Self {
        Self { ledger }
    }

    /// Totals over the rows whose batch date falls in `range`.
    pub async fn aggregate(&self, range: DateRange) -> DomainResult<Aggregate> {
        let pairs = self.ledger.scan(range).await?;
        Ok(aggregate(pairs))
    }

    pub async fn all_time(&self) -> DomainResult<Aggregate> {
        self.aggregate(DateRange::all()).await
    }

    pub async fn for_day(&self, date: NaiveDate) -> DomainResult<Aggregate> {
        self.aggregate(DateRange::on(date)).await
    }

    /// Grouped history, most recent period first.
    pub async fn history(&self, period: Period, range: DateRange) -> DomainResult<Vec<PeriodRow>> {
        self.ledger.group_by_period(period, range).await
    }

    /// Earliest and latest batch dates in the ledger.
    pub async fn date_bounds(&self) -> DomainResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        self.ledger.min_max_dates().await
    }
}
