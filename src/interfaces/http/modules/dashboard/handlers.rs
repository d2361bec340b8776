//! HTML page handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;

use super::views::{self, HistoryFilter};
use crate::application::ReportService;
use crate::config::SharedConfig;
use crate::interfaces::http::modules::analytics::HistoryParams;

#[derive(Clone)]
pub struct DashboardState {
    pub reports: ReportService,
    pub config: SharedConfig,
}

type PageResult = Result<Html<String>, (StatusCode, String)>;

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Report error: {}", e))
}

/// `GET /`: all-time totals and the upload form.
pub async fn dashboard(State(state): State<DashboardState>) -> PageResult {
    let totals = state.reports.all_time().await.map_err(internal)?;
    Ok(Html(views::dashboard_page(&totals)))
}

/// `GET /history`: grouped history table with its filter form.
pub async fn history(
    State(state): State<DashboardState>,
    Query(params): Query<HistoryParams>,
) -> PageResult {
    let (period, range) = params
        .resolve()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let rows = state.reports.history(period, range).await.map_err(internal)?;
    let (min_date, max_date) = state.reports.date_bounds().await.map_err(internal)?;

    let filter = HistoryFilter {
        period,
        from: params.from.as_deref().unwrap_or_default(),
        to: params.to.as_deref().unwrap_or_default(),
        min_date,
        max_date,
    };
    Ok(Html(views::history_page(&filter, &rows)))
}

/// `GET /settings`: settings form backed by `/api/settings`.
pub async fn settings(State(state): State<DashboardState>) -> Html<String> {
    let config = state.config.read().await;
    Html(views::settings_page(&config))
}
