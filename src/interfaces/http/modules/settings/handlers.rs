//! Settings API handlers

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use super::dto::*;
use crate::config::SharedConfig;
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse, ValidatedJson};
use crate::notifications::TelegramLink;

#[derive(Clone)]
pub struct SettingsState {
    pub config: SharedConfig,
    pub config_path: Arc<PathBuf>,
    pub telegram: TelegramLink,
}

/// Current settings.
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Current settings", body = ApiResponse<SettingsResponse>)
    )
)]
pub async fn get_settings(State(state): State<SettingsState>) -> Json<ApiResponse<SettingsResponse>> {
    let settings = SettingsDto::from_config(&*state.config.read().await);
    let bot_username = state.telegram.current().await.map(|bot| bot.username);

    Json(ApiResponse::success(SettingsResponse {
        settings,
        bot_username,
        restart_required: false,
    }))
}

/// Save settings to the config file and reconnect the bot.
///
/// Port and database changes take effect on the next start.
#[utoipa::path(
    post,
    path = "/api/settings",
    tag = "Settings",
    request_body = SettingsDto,
    responses(
        (status = 200, description = "Settings saved", body = ApiResponse<SettingsResponse>),
        (status = 400, description = "Malformed JSON", body = ApiResponse<String>),
        (status = 422, description = "Validation failed", body = ApiResponse<String>),
        (status = 500, description = "Config file not writable", body = ApiResponse<String>)
    )
)]
pub async fn save_settings(
    State(state): State<SettingsState>,
    ValidatedJson(body): ValidatedJson<SettingsDto>,
) -> Result<Json<ApiResponse<SettingsResponse>>, ApiError<SettingsResponse>> {
    let (config, restart_required) = {
        // Held across the write so the file and the live copy change in the same order
        let mut config = state.config.write().await;
        let mut updated = config.clone();
        let restart_required = body.apply_to(&mut updated);

        updated
            .save_async(&state.config_path)
            .await
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        *config = updated.clone();
        info!("Settings saved to {}", state.config_path.display());
        (updated, restart_required)
    };

    let bot_username = state.telegram.configure(&config.telegram).await;

    Ok(Json(ApiResponse::success(SettingsResponse {
        settings: SettingsDto::from_config(&config),
        bot_username,
        restart_required,
    })))
}
