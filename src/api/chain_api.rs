//! 链列表 API

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::chain_config::ChainConfig,
    error::AppError,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ChainDto {
    /// 链标识，例如 "Arc_Testnet"
    pub key: String,
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: Option<String>,
    pub native_currency: String,
    pub tokens: Vec<TokenDto>,
    pub swap_bridge_address: Option<String>,
    pub cctp_domain: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenDto {
    pub symbol: String,
    pub address: String,
}

impl From<&ChainConfig> for ChainDto {
    fn from(chain: &ChainConfig) -> Self {
        Self {
            key: chain.key.to_string(),
            name: chain.name.clone(),
            chain_id: chain.chain_id,
            rpc_url: chain.rpc_url.clone(),
            explorer_url: chain.explorer_url.clone(),
            native_currency: chain.native_currency.symbol.to_string(),
            tokens: chain
                .tokens
                .iter()
                .map(|(symbol, address)| TokenDto {
                    symbol: symbol.to_string(),
                    address: format!("{:?}", address),
                })
                .collect(),
            swap_bridge_address: chain.swap_bridge_address.map(|a| format!("{:?}", a)),
            cctp_domain: chain.cctp_domain,
        }
    }
}

/// GET /api/v1/chains
///
/// 可选的源链/目标链（开发模式下包含 Localhost）
#[utoipa::path(
    get,
    path = "/api/v1/chains",
    responses((status = 200, description = "Selectable chains", body = [ChainDto]))
)]
pub async fn list_chains(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ChainDto>>>, AppError> {
    success_response(state.registry.list_all().iter().map(ChainDto::from).collect())
}
