//! Analytics API data transfer objects

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Aggregate, DateRange, Period, SlabCounts};

/// All-time totals, as served to the dashboard's chart script.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub revenue: f64,
    pub gst: f64,
    pub slabs: SlabCounts,
}

impl From<Aggregate> for AnalyticsResponse {
    fn from(totals: Aggregate) -> Self {
        Self {
            revenue: totals.revenue.as_f64(),
            gst: totals.gst.as_f64(),
            slabs: totals.slabs,
        }
    }
}

/// History filter. Dates are `YYYY-MM-DD`; empty values mean unbounded.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryParams {
    /// "day", "week", "month" or "year". Anything else means "day".
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl HistoryParams {
    /// Resolve to a period and date range. Unknown periods fall back to
    /// day; a date that does not parse is an error naming the parameter.
    pub fn resolve(&self) -> Result<(Period, DateRange), String> {
        let period = Period::parse_or_default(self.period.as_deref());
        let from = parse_bound("from", self.from.as_deref())?;
        let to = parse_bound("to", self.to.as_deref())?;
        Ok((period, DateRange::between(from, to)))
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("invalid '{}' date: {} (expected YYYY-MM-DD)", name, value)),
    }
}
