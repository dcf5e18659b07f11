//! 余额加载

use ethers::types::U256;

use crate::{
    contracts::Erc20Contract,
    domain::{
        chain_config::{ChainConfig, TokenSymbol},
        session::Session,
    },
    error::{AppError, AppErrorCode},
    error_map::map_read_error,
    utils::amount::format_display,
};

/// 一次成功的余额读取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedBalance {
    pub raw: U256,
    pub decimals: u8,
    pub display: String,
}

#[derive(Debug, Clone, Default)]
pub struct BalanceLoader;

impl BalanceLoader {
    pub fn new() -> Self {
        Self
    }

    /// 读取会话账户在 `chain` 上的 `token` 余额
    ///
    /// 在任何合约调用之前先确认签名句柄实际所在的链与 `chain` 一致。
    pub async fn load(
        &self,
        session: Option<&Session>,
        chain: &ChainConfig,
        token: TokenSymbol,
    ) -> Result<LoadedBalance, AppError> {
        let session = session
            .ok_or_else(|| AppError::new(AppErrorCode::NotConnected, "Wallet not connected"))?;
        let token_address = chain
            .token_address(token)
            .ok_or_else(|| AppError::token_not_configured(token.as_str()))?;

        let signer = session.signer();
        let actual_chain_id = signer
            .chain_id()
            .await
            .map_err(|e| map_read_error(&e, chain))?;
        if actual_chain_id != chain.chain_id {
            tracing::warn!(
                expected = chain.chain_id,
                actual = actual_chain_id,
                "Signer is on a different network than the selected chain"
            );
            return Err(AppError::network_mismatch(&chain.name, chain.chain_id));
        }

        let contract = Erc20Contract::new(token_address, signer);
        let balance = contract.balance_of(session.address);
        let decimals = contract.decimals();
        let (raw, decimals) = tokio::try_join!(balance, decimals).map_err(|e| {
            tracing::warn!(chain = %chain.name, token = %token, error = %e, "Balance read failed");
            map_read_error(&e, chain)
        })?;

        let shown = format_display(raw, decimals);
        tracing::debug!(chain = %chain.name, token = %token, balance = %shown, "Balance loaded");
        Ok(LoadedBalance {
            raw,
            decimals,
            display: shown,
        })
    }
}
