use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    error::AppError,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub development: bool,
    pub wallet_available: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "OK", body = HealthResponse))
)]
pub async fn api_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthResponse>>, AppError> {
    success_response(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        development: state.config.server.development,
        wallet_available: state.console.sessions().has_wallet(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorCatalogEntry {
    pub code: String,
    pub message: String,
}

/// 错误码目录，前端据此本地化
#[utoipa::path(
    get,
    path = "/api/v1/errors",
    responses((status = 200, description = "Error catalog", body = [ErrorCatalogEntry]))
)]
pub async fn api_errors() -> Result<Json<ApiResponse<Vec<ErrorCatalogEntry>>>, AppError> {
    let entries = crate::error_map::error_map()
        .into_iter()
        .map(|(code, message)| ErrorCatalogEntry {
            code: code.to_string(),
            message: message.to_string(),
        })
        .collect();
    success_response(entries)
}
