//! Aggregation over toll transactions
//!
//! Revenue/GST totals, the three fixed-price slabs, calendar periods and the
//! per-upload summary.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::Money;

pub const SLAB_125: Money = Money::from_major(125);
pub const SLAB_75: Money = Money::from_major(75);
pub const SLAB_0: Money = Money::ZERO;

/// Counts of transactions charged exactly one of the slab prices.
///
/// Amounts matching no slab are not counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SlabCounts {
    #[serde(rename = "Count125")]
    pub count_125: u64,
    #[serde(rename = "Count75")]
    pub count_75: u64,
    #[serde(rename = "Count0")]
    pub count_0: u64,
}

impl SlabCounts {
    /// Classify one amount. Returns `false` when it falls in no slab.
    pub fn record(&mut self, amount: Money) -> bool {
        self.record_many(amount, 1)
    }

    /// Classify `count` rows charged the same amount.
    pub fn record_many(&mut self, amount: Money, count: u64) -> bool {
        let slot = if amount == SLAB_125 {
            &mut self.count_125
        } else if amount == SLAB_75 {
            &mut self.count_75
        } else if amount == SLAB_0 {
            &mut self.count_0
        } else {
            return false;
        };
        *slot += count;
        true
    }

    pub fn classified(&self) -> u64 {
        self.count_125 + self.count_75 + self.count_0
    }
}

/// Totals over a set of `(amount, gst)` pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Aggregate {
    #[schema(value_type = f64)]
    pub revenue: Money,
    #[schema(value_type = f64)]
    pub gst: Money,
    pub slabs: SlabCounts,
    pub rows: u64,
}

impl Aggregate {
    pub fn add(&mut self, amount: Money, gst: Money) {
        self.add_many(amount, gst, 1);
    }

    /// Add `count` identical rows at once.
    pub fn add_many(&mut self, amount: Money, gst: Money, count: u64) {
        self.revenue += amount.times(count);
        self.gst += gst.times(count);
        self.slabs.record_many(amount, count);
        self.rows += count;
    }
}

impl FromIterator<(Money, Money)> for Aggregate {
    fn from_iter<I: IntoIterator<Item = (Money, Money)>>(iter: I) -> Self {
        let mut acc = Aggregate::default();
        for (amount, gst) in iter {
            acc.add(amount, gst);
        }
        acc
    }
}

/// Fold `(amount, gst)` pairs into revenue, GST, slab counts and a row count.
pub fn aggregate<I>(pairs: I) -> Aggregate
where
    I: IntoIterator<Item = (Money, Money)>,
{
    pairs.into_iter().collect()
}

/// Calendar bucket used to group history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Parse a query value; anything unrecognised means `day`.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    /// Sortable bucket key for a date: `YYYY-MM-DD`, `YYYY-Www` (ISO week),
    /// `YYYY-MM` or `YYYY`.
    pub fn bucket_key(&self, date: NaiveDate) -> String {
        match self {
            Period::Day => date.format("%Y-%m-%d").to_string(),
            Period::Week => {
                let iso = date.iso_week();
                format!("{:04}-W{:02}", iso.year(), iso.week())
            }
            Period::Month => format!("{:04}-{:02}", date.year(), date.month()),
            Period::Year => format!("{:04}", date.year()),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive filter on the upload batch date; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn on(date: NaiveDate) -> Self {
        Self {
            from: Some(date),
            to: Some(date),
        }
    }

    pub fn between(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// One row of grouped history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PeriodRow {
    pub period: String,
    #[schema(value_type = f64)]
    pub revenue: Money,
    #[serde(rename = "GST")]
    #[schema(value_type = f64)]
    pub gst: Money,
    #[serde(rename = "Count125")]
    pub count_125: u64,
    #[serde(rename = "Count75")]
    pub count_75: u64,
    #[serde(rename = "Count0")]
    pub count_0: u64,
    pub total: u64,
}

impl PeriodRow {
    pub fn new(period: String, totals: &Aggregate) -> Self {
        Self {
            period,
            revenue: totals.revenue,
            gst: totals.gst,
            count_125: totals.slabs.count_125,
            count_75: totals.slabs.count_75,
            count_0: totals.slabs.count_0,
            total: totals.rows,
        }
    }
}

/// Group dated `(amount, gst, count)` tallies into periods, most recent
/// period first. `count` is how many rows share that date and pair.
pub fn group_into_periods<I>(period: Period, tallies: I) -> Vec<PeriodRow>
where
    I: IntoIterator<Item = (NaiveDate, Money, Money, u64)>,
{
    let mut buckets: BTreeMap<String, Aggregate> = BTreeMap::new();
    for (date, amount, gst, count) in tallies {
        buckets
            .entry(period.bucket_key(date))
            .or_default()
            .add_many(amount, gst, count);
    }

    buckets
        .into_iter()
        .rev()
        .map(|(key, totals)| PeriodRow::new(key, &totals))
        .collect()
}

/// Result of ingesting one CSV document.
///
/// Totals cover every decoded row, including rows whose key was already
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadSummary {
    pub filename: Option<String>,
    pub batch_date: NaiveDate,
    pub rows: u64,
    /// Rows that were new to the store.
    pub inserted: u64,
    #[schema(value_type = f64)]
    pub revenue: Money,
    #[schema(value_type = f64)]
    pub gst: Money,
    pub slabs: SlabCounts,
}

impl UploadSummary {
    pub fn new(batch_date: NaiveDate, filename: Option<String>) -> Self {
        Self {
            filename,
            batch_date,
            rows: 0,
            inserted: 0,
            revenue: Money::ZERO,
            gst: Money::ZERO,
            slabs: SlabCounts::default(),
        }
    }

    pub fn record(&mut self, amount: Money, gst: Money, inserted: bool) {
        self.rows += 1;
        if inserted {
            self.inserted += 1;
        }
        self.revenue += amount;
        self.gst += gst;
        self.slabs.record(amount);
    }

    pub fn duplicates(&self) -> u64 {
        self.rows - self.inserted
    }
}
