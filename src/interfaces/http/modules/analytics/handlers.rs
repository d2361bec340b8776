//! Analytics API handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::*;
use crate::application::ReportService;
use crate::domain::PeriodRow;
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse};

#[derive(Clone)]
pub struct AnalyticsState {
    pub reports: ReportService,
}

/// All-time revenue, GST and slab counts.
#[utoipa::path(
    get,
    path = "/api/analytics",
    tag = "Analytics",
    responses(
        (status = 200, description = "All-time totals", body = AnalyticsResponse),
        (status = 500, description = "Ledger unavailable", body = ApiResponse<String>)
    )
)]
pub async fn get_analytics(
    State(state): State<AnalyticsState>,
) -> Result<Json<AnalyticsResponse>, ApiError<String>> {
    let totals = state
        .reports
        .all_time()
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(totals.into()))
}

/// Totals grouped by day, ISO week, month or year; most recent first.
#[utoipa::path(
    get,
    path = "/api/history",
    tag = "Analytics",
    params(HistoryParams),
    responses(
        (status = 200, description = "Grouped history", body = Vec<PeriodRow>),
        (status = 400, description = "Malformed date", body = ApiResponse<String>),
        (status = 500, description = "Ledger unavailable", body = ApiResponse<String>)
    )
)]
pub async fn get_history(
    State(state): State<AnalyticsState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<PeriodRow>>, ApiError<String>> {
    let (period, range) = params
        .resolve()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let rows = state
        .reports
        .history(period, range)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(rows))
}
