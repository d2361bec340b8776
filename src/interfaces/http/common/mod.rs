//! Shared HTTP response types and extractors

mod validated_json;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use validated_json::{ValidatedJson, ValidatedJsonRejection};

/// Envelope for JSON endpoints that can fail.
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error half of a JSON handler result.
pub type ApiError<T> = (StatusCode, Json<ApiResponse<T>>);

pub fn api_error<T>(status: StatusCode, message: impl Into<String>) -> ApiError<T> {
    (status, Json(ApiResponse::error(message)))
}
