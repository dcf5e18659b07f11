//! 兑换表单、费用和提交 API

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    api::{
        middleware::trace_id::{TraceId, Traced},
        response::{success_response, success_response_with_message, ApiResponse},
    },
    app_state::AppState,
    domain::{
        chain_config::{ChainKey, TokenSymbol},
        swap::{FeeEstimate, FormUpdate, SwapResult},
    },
    error::AppError,
    service::{swap_console::BridgeInfo, ConsoleSnapshot},
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateFormRequest {
    /// 例如 "Arc_Testnet"
    pub from_chain: Option<String>,
    pub to_chain: Option<String>,
    /// "USDC" | "EURC"
    pub token: Option<String>,
    pub amount: Option<String>,
}

impl UpdateFormRequest {
    fn into_update(self) -> Result<FormUpdate, AppError> {
        let chain = |raw: Option<String>| -> Result<Option<ChainKey>, AppError> {
            raw.map(|s| s.parse::<ChainKey>().map_err(AppError::chain_not_supported))
                .transpose()
        };

        Ok(FormUpdate {
            from_chain: chain(self.from_chain)?,
            to_chain: chain(self.to_chain)?,
            token: self
                .token
                .map(|s| s.parse::<TokenSymbol>().map_err(AppError::bad_request))
                .transpose()?,
            amount: self.amount,
        })
    }
}

/// GET /api/v1/state
#[utoipa::path(
    get,
    path = "/api/v1/state",
    tag = "swap",
    responses((status = 200, description = "Current console state"))
)]
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ConsoleSnapshot>>, AppError> {
    success_response(state.console.snapshot().await)
}

/// PUT /api/v1/form
///
/// 局部更新表单；源链或代币变化会触发网络同步和余额刷新
#[utoipa::path(
    put,
    path = "/api/v1/form",
    tag = "swap",
    request_body = UpdateFormRequest,
    responses(
        (status = 200, description = "Form updated"),
        (status = 400, description = "Unknown chain or token")
    )
)]
pub async fn update_form(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Json(req): Json<UpdateFormRequest>,
) -> Result<Json<ApiResponse<ConsoleSnapshot>>, AppError> {
    let update = req.into_update().traced(&trace_id)?;
    let snapshot = state.console.update_form(update).await.traced(&trace_id)?;
    success_response(snapshot)
}

/// POST /api/v1/form/flip
#[utoipa::path(
    post,
    path = "/api/v1/form/flip",
    tag = "swap",
    responses((status = 200, description = "Source and destination swapped"))
)]
pub async fn flip_chains(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> Result<Json<ApiResponse<ConsoleSnapshot>>, AppError> {
    let snapshot = state.console.flip_chains().await.traced(&trace_id)?;
    success_response(snapshot)
}

/// GET /api/v1/fee
///
/// 按当前表单重新估算费用；金额无效时 data 为 null
#[utoipa::path(
    get,
    path = "/api/v1/fee",
    tag = "swap",
    responses((status = 200, description = "Fee estimate"))
)]
pub async fn get_fee(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Option<FeeEstimate>>>, AppError> {
    success_response(state.console.estimate_fee().await)
}

/// GET /api/v1/bridge
#[utoipa::path(
    get,
    path = "/api/v1/bridge",
    tag = "swap",
    responses(
        (status = 200, description = "Bridge fee and minimum amount"),
        (status = 400, description = "Bridge not configured for the source chain")
    )
)]
pub async fn get_bridge(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> Result<Json<ApiResponse<BridgeInfo>>, AppError> {
    let info = state.console.bridge_info().await.traced(&trace_id)?;
    success_response(info)
}

/// POST /api/v1/swap
///
/// 校验后依次提交 approve（按需）和 swap，两笔交易都上链后返回
#[utoipa::path(
    post,
    path = "/api/v1/swap",
    tag = "swap",
    responses(
        (status = 200, description = "Swap confirmed"),
        (status = 400, description = "Validation failed"),
        (status = 502, description = "Transaction failed")
    )
)]
pub async fn submit_swap(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> Result<Json<ApiResponse<SwapResult>>, AppError> {
    let result = state.console.submit_swap().await.traced(&trace_id)?;
    let message = result.summary();
    success_response_with_message(result, message)
}
