//! 费用估算
//!
//! Local 模式下读取桥合约的 `bridgeFeeBps` 计算确定费用；
//! Demo 模式或读取失败时退回启发式估算，并标记为 Estimated。

use std::sync::Arc;

use ethers::types::{Address, U256};
use rust_decimal::Decimal;

use crate::{
    contracts::{ContractTransport, SwapBridgeContract},
    domain::{
        chain_config::TokenSymbol,
        swap::{FeeEstimate, FeeKind, OperatingMode},
    },
    utils::amount::{apply_basis_points, format_amount, heuristic_fee, parse_amount},
};

/// 估算所需的合约上下文
pub struct FeeContext {
    pub mode: OperatingMode,
    pub signer: Option<Arc<dyn ContractTransport>>,
    pub bridge: Option<Address>,
    pub token: TokenSymbol,
    /// 最近一次读到的代币精度
    pub decimals: u8,
}

#[derive(Debug, Clone)]
pub struct FeeEstimator {
    base_fee: Decimal,
    rate: Decimal,
}

impl FeeEstimator {
    pub fn new(base_fee: Decimal, rate: Decimal) -> Self {
        Self { base_fee, rate }
    }

    /// 金额不是正数时返回 None
    pub async fn estimate(&self, amount: &str, ctx: FeeContext) -> Option<FeeEstimate> {
        if !is_positive(amount) {
            return None;
        }

        if ctx.mode == OperatingMode::Demo {
            return self.heuristic(amount, ctx.token, None);
        }

        let (signer, bridge) = match (ctx.signer, ctx.bridge) {
            (Some(signer), Some(bridge)) => (signer, bridge),
            (None, _) => {
                return self.heuristic(amount, ctx.token, Some("Wallet not connected".into()))
            }
            (_, None) => {
                return self.heuristic(
                    amount,
                    ctx.token,
                    Some("Swap bridge address not configured".into()),
                )
            }
        };

        match self.confirmed(amount, signer, bridge, ctx.decimals).await {
            Ok((raw, fee)) => Some(FeeEstimate {
                amount: fee,
                raw: Some(raw),
                token: ctx.token,
                kind: FeeKind::Confirmed,
                fallback_reason: None,
            }),
            Err(reason) => {
                tracing::warn!(reason = %reason, "Bridge fee read failed, using heuristic");
                self.heuristic(amount, ctx.token, Some(reason))
            }
        }
    }

    async fn confirmed(
        &self,
        amount: &str,
        signer: Arc<dyn ContractTransport>,
        bridge: Address,
        decimals: u8,
    ) -> Result<(U256, String), String> {
        let raw = parse_amount(amount, decimals).map_err(|e| e.to_string())?;
        let bps = SwapBridgeContract::new(bridge, signer)
            .bridge_fee_bps()
            .await
            .map_err(|e| e.to_string())?;
        let fee = apply_basis_points(raw, bps).ok_or_else(|| "fee overflows uint256".to_string())?;
        Ok((fee, format_amount(fee, decimals)))
    }

    pub fn heuristic(
        &self,
        amount: &str,
        token: TokenSymbol,
        fallback_reason: Option<String>,
    ) -> Option<FeeEstimate> {
        heuristic_fee(amount, self.base_fee, self.rate).map(|fee| FeeEstimate {
            amount: fee,
            raw: None,
            token,
            kind: FeeKind::Estimated,
            fallback_reason,
        })
    }
}

fn is_positive(amount: &str) -> bool {
    amount
        .trim()
        .parse::<Decimal>()
        .map(|v| v > Decimal::ZERO)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> FeeEstimator {
        FeeEstimator::new(Decimal::new(1, 2), Decimal::new(1, 3))
    }

    fn demo_ctx() -> FeeContext {
        FeeContext {
            mode: OperatingMode::Demo,
            signer: None,
            bridge: None,
            token: TokenSymbol::USDC,
            decimals: 6,
        }
    }

    #[tokio::test]
    async fn test_demo_mode_uses_heuristic() {
        let fee = estimator().estimate("100", demo_ctx()).await.unwrap();
        assert_eq!(fee.amount, "0.1100");
        assert_eq!(fee.kind, FeeKind::Estimated);
        assert_eq!(fee.fallback_reason, None);
    }

    #[tokio::test]
    async fn test_non_positive_amount_has_no_fee() {
        assert!(estimator().estimate("", demo_ctx()).await.is_none());
        assert!(estimator().estimate("0", demo_ctx()).await.is_none());
        assert!(estimator().estimate("-3", demo_ctx()).await.is_none());
        assert!(estimator().estimate("abc", demo_ctx()).await.is_none());
    }

    #[tokio::test]
    async fn test_local_mode_without_bridge_falls_back() {
        let ctx = FeeContext {
            mode: OperatingMode::Local,
            ..demo_ctx()
        };
        let fee = estimator().estimate("10", ctx).await.unwrap();
        assert_eq!(fee.kind, FeeKind::Estimated);
        assert!(fee.fallback_reason.is_some());
    }
}
