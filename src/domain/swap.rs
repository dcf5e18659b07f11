//! 兑换相关的领域模型：表单、余额视图、费用估算、执行阶段和结果

use chrono::{DateTime, Utc};
use ethers::types::{H256, U256};
use serde::{Deserialize, Serialize};

use super::chain_config::{ChainKey, TokenSymbol};

/// 运行模式
///
/// 源链是本地开发链，或者本地合约地址都已配置时为 `Local`，
/// 此时兑换真正上链；否则为 `Demo`，只给出启发式费用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    Local,
    Demo,
}

/// 兑换表单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapForm {
    pub from_chain: ChainKey,
    pub to_chain: ChainKey,
    pub token: TokenSymbol,
    /// 用户输入的原始金额字符串
    pub amount: String,
}

impl Default for SwapForm {
    fn default() -> Self {
        Self {
            from_chain: ChainKey::ArcTestnet,
            to_chain: ChainKey::EthereumSepolia,
            token: TokenSymbol::USDC,
            amount: String::new(),
        }
    }
}

/// 表单局部更新，缺省字段保持不变
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormUpdate {
    pub from_chain: Option<ChainKey>,
    pub to_chain: Option<ChainKey>,
    pub token: Option<TokenSymbol>,
    pub amount: Option<String>,
}

impl FormUpdate {
    /// 应用到表单，返回哪些字段实际发生了变化
    pub fn apply(self, form: &mut SwapForm) -> FormChanges {
        let mut changes = FormChanges::default();

        if let Some(from) = self.from_chain.filter(|c| *c != form.from_chain) {
            form.from_chain = from;
            changes.source = true;
        }
        if let Some(to) = self.to_chain.filter(|c| *c != form.to_chain) {
            form.to_chain = to;
            changes.destination = true;
        }
        if let Some(token) = self.token.filter(|t| *t != form.token) {
            form.token = token;
            changes.source = true;
        }
        if let Some(amount) = self.amount.filter(|a| *a != form.amount) {
            form.amount = amount;
            changes.amount = true;
        }

        changes
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormChanges {
    /// 源链或代币变化：需要重新同步网络并加载余额
    pub source: bool,
    pub destination: bool,
    pub amount: bool,
}

/// 余额视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    pub chain: Option<ChainKey>,
    pub token: Option<TokenSymbol>,
    /// 两位小数的展示值
    pub display: String,
    /// 最小单位原始值，仅在成功加载后存在
    pub raw: Option<U256>,
    pub decimals: u8,
    pub loading: bool,
    pub error: Option<String>,
}

pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

impl Default for BalanceView {
    fn default() -> Self {
        Self {
            chain: None,
            token: None,
            display: "0.00".to_string(),
            raw: None,
            decimals: DEFAULT_TOKEN_DECIMALS,
            loading: false,
            error: None,
        }
    }
}

impl BalanceView {
    pub fn loading(chain: ChainKey, token: TokenSymbol, decimals: u8) -> Self {
        Self {
            chain: Some(chain),
            token: Some(token),
            decimals,
            loading: true,
            ..Self::default()
        }
    }

    pub fn loaded(
        chain: ChainKey,
        token: TokenSymbol,
        raw: U256,
        decimals: u8,
        display: String,
    ) -> Self {
        Self {
            chain: Some(chain),
            token: Some(token),
            display,
            raw: Some(raw),
            decimals,
            loading: false,
            error: None,
        }
    }

    /// 加载失败：余额归零并带上错误文案
    pub fn failed(chain: ChainKey, token: TokenSymbol, decimals: u8, error: String) -> Self {
        Self {
            chain: Some(chain),
            token: Some(token),
            decimals,
            error: Some(error),
            ..Self::default()
        }
    }

    /// 仅当视图对应当前表单的链和代币时才可用于余额校验
    pub fn raw_for(&self, chain: ChainKey, token: TokenSymbol) -> Option<U256> {
        if self.chain == Some(chain) && self.token == Some(token) {
            self.raw
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    /// 从桥合约读取费率计算
    Confirmed,
    /// 启发式估算
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeEstimate {
    pub amount: String,
    /// 最小单位，仅 Confirmed 时存在
    pub raw: Option<U256>,
    pub token: TokenSymbol,
    pub kind: FeeKind,
    /// 本应读合约但失败时的原因
    pub fallback_reason: Option<String>,
}

/// 兑换执行阶段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStage {
    #[default]
    Idle,
    CheckingAllowance,
    Approving,
    Swapping,
}

impl SwapStage {
    pub fn is_busy(&self) -> bool {
        !matches!(self, SwapStage::Idle)
    }

    pub fn description(&self) -> &'static str {
        match self {
            SwapStage::Idle => "Swap",
            SwapStage::CheckingAllowance => "Checking allowance...",
            SwapStage::Approving => "Approving...",
            SwapStage::Swapping => "Swapping...",
        }
    }
}

/// 已上链的兑换
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapResult {
    pub tx_hash: H256,
    /// 需要授权时的 approve 交易
    pub approval_tx_hash: Option<H256>,
    pub from_chain: ChainKey,
    pub to_chain: ChainKey,
    pub destination_chain_id: u64,
    pub token: TokenSymbol,
    pub amount: String,
    pub block_number: Option<u64>,
    pub explorer_url: Option<String>,
    pub confirmed_at: DateTime<Utc>,
}

impl SwapResult {
    pub fn summary(&self) -> String {
        format!(
            "Swap successful! {} {} from {} to {}. Transaction: {:?}",
            self.amount, self.token, self.from_chain, self.to_chain, self.tx_hash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_update_reports_changes() {
        let mut form = SwapForm::default();

        let changes = FormUpdate {
            amount: Some("10".into()),
            ..Default::default()
        }
        .apply(&mut form);
        assert!(changes.amount);
        assert!(!changes.source);

        let changes = FormUpdate {
            from_chain: Some(ChainKey::ArcTestnet),
            token: Some(TokenSymbol::EURC),
            ..Default::default()
        }
        .apply(&mut form);
        assert!(changes.source);
        assert_eq!(form.token, TokenSymbol::EURC);

        // 相同值不算变化
        let changes = FormUpdate {
            token: Some(TokenSymbol::EURC),
            ..Default::default()
        }
        .apply(&mut form);
        assert_eq!(changes, FormChanges::default());
    }

    #[test]
    fn test_balance_view_states() {
        let view = BalanceView::failed(
            ChainKey::ArcTestnet,
            TokenSymbol::USDC,
            6,
            "Network error".into(),
        );
        assert_eq!(view.display, "0.00");
        assert_eq!(view.raw, None);
        assert!(!view.loading);

        let view = BalanceView::loaded(
            ChainKey::ArcTestnet,
            TokenSymbol::USDC,
            U256::from(5_000_000u64),
            6,
            "5.00".into(),
        );
        assert_eq!(
            view.raw_for(ChainKey::ArcTestnet, TokenSymbol::USDC),
            Some(U256::from(5_000_000u64))
        );
        assert_eq!(view.raw_for(ChainKey::PolygonAmoy, TokenSymbol::USDC), None);
    }

    #[test]
    fn test_swap_stage() {
        assert!(!SwapStage::Idle.is_busy());
        assert!(SwapStage::Approving.is_busy());
        assert_eq!(SwapStage::Swapping.description(), "Swapping...");
    }
}
