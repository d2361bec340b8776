//! Settings API data transfer objects

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::config::AppConfig;

/// Editable subset of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct SettingsDto {
    /// Bot token from @BotFather; empty disables the bot.
    #[serde(default)]
    #[validate(custom(function = "validate_bot_token"))]
    pub telegram_token: String,
    /// Only chat allowed to use the bot; 0 allows any chat.
    #[serde(default)]
    pub admin_chat_id: i64,
    /// Listening port; applied on restart.
    #[validate(range(min = 1))]
    pub port: u16,
    /// SQLite file; applied on restart.
    #[validate(length(min = 1, max = 4096, message = "must not be empty"))]
    pub db_path: String,
    #[validate(length(min = 1, max = 4096, message = "must not be empty"))]
    pub uploads_dir: String,
}

/// Bot tokens look like `<bot id>:<secret>`.
fn validate_bot_token(token: &str) -> Result<(), ValidationError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(());
    }
    match token.split_once(':') {
        Some((id, secret))
            if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && !secret.is_empty() =>
        {
            Ok(())
        }
        _ => {
            let mut err = ValidationError::new("bot_token");
            err.message = Some("expected <bot id>:<secret>".into());
            Err(err)
        }
    }
}

impl SettingsDto {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            telegram_token: config.telegram.token.clone(),
            admin_chat_id: config.telegram.admin_chat_id,
            port: config.server.port,
            db_path: config.database.path.clone(),
            uploads_dir: config.storage.uploads_dir.to_string_lossy().into_owned(),
        }
    }

    /// Write these settings into `config`. Returns whether a restart is
    /// needed for them to take effect.
    pub fn apply_to(&self, config: &mut AppConfig) -> bool {
        let uploads_dir = PathBuf::from(self.uploads_dir.trim());
        let restart_required = config.server.port != self.port
            || config.database.path != self.db_path.trim()
            || config.storage.uploads_dir != uploads_dir;

        config.telegram.token = self.telegram_token.trim().to_string();
        config.telegram.admin_chat_id = self.admin_chat_id;
        config.server.port = self.port;
        config.database.path = self.db_path.trim().to_string();
        config.storage.uploads_dir = uploads_dir;
        restart_required
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub settings: SettingsDto,
    /// Username of the connected bot, if the token works.
    pub bot_username: Option<String>,
    pub restart_required: bool,
}
