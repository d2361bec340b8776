//! Prometheus scrape endpoint
//!
//! Renders the process-wide `metrics-exporter-prometheus` recorder after
//! refreshing the ledger size gauge.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::domain::LedgerRepository;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
    pub ledger: Arc<dyn LedgerRepository>,
}

/// `GET /metrics`
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    match state.ledger.count().await {
        Ok(rows) => metrics::gauge!("ledger_transactions").set(rows as f64),
        Err(e) => tracing::warn!("Could not count ledger rows: {}", e),
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}
