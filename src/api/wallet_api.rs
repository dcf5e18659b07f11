//! 钱包连接与余额 API

use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use crate::{
    api::{
        middleware::trace_id::{TraceId, Traced},
        response::{success_response, ApiResponse},
    },
    app_state::AppState,
    domain::swap::BalanceView,
    error::AppError,
    service::ConsoleSnapshot,
};

/// POST /api/v1/wallet/connect
///
/// 请求账户授权，随后切换到源链并加载余额
#[utoipa::path(
    post,
    path = "/api/v1/wallet/connect",
    tag = "wallet",
    responses(
        (status = 200, description = "Wallet connected"),
        (status = 503, description = "No wallet available"),
        (status = 401, description = "Request rejected in wallet")
    )
)]
pub async fn connect_wallet(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> Result<Json<ApiResponse<ConsoleSnapshot>>, AppError> {
    let snapshot = state.console.connect().await.traced(&trace_id)?;
    success_response(snapshot)
}

/// POST /api/v1/balance/refresh
///
/// 重新读取源链余额；读取失败时 `error` 字段给出原因，余额显示为 0.00
#[utoipa::path(
    post,
    path = "/api/v1/balance/refresh",
    tag = "wallet",
    responses((status = 200, description = "Balance view"))
)]
pub async fn refresh_balance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<BalanceView>>, AppError> {
    success_response(state.console.refresh_balance().await)
}
