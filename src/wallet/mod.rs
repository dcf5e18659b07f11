//! 注入式钱包（EIP-1193）抽象
//!
//! 核心逻辑只依赖 `WalletProvider`，具体实现见
//! `infrastructure::wallet_rpc::RpcWalletProvider`。

use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::contracts::ContractTransport;

/// EIP-1193 用户拒绝请求
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// EIP-3326 钱包不认识该链
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    #[error("no injected wallet provider available")]
    Unavailable,
    #[error("wallet rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("wallet transport error: {0}")]
    Transport(String),
}

impl WalletError {
    pub fn code(&self) -> Option<i64> {
        match self {
            WalletError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(USER_REJECTED_REQUEST)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code() == Some(UNRECOGNIZED_CHAIN)
    }
}

/// 钱包推送的通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WalletEvent {
    ChainChanged(u64),
    AccountsChanged(Vec<Address>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrencyParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// `wallet_addEthereumChain` 参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    /// 0x 前缀的十六进制链 ID
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrencyParams,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Option<Vec<String>>,
}

pub fn chain_id_hex(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// 钱包当前所在的链
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// `wallet_switchEthereumChain`
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// `wallet_addEthereumChain`
    async fn add_chain(&self, params: &AddChainParams) -> Result<(), WalletError>;

    /// 订阅 chainChanged / accountsChanged
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// 基于钱包当前网络上下文创建签名句柄
    async fn signer(&self, account: Address) -> Result<Arc<dyn ContractTransport>, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_hex() {
        assert_eq!(chain_id_hex(5042002), "0x4cef52");
        assert_eq!(chain_id_hex(31337), "0x7a69");
        assert_eq!(chain_id_hex(11155111), "0xaa36a7");
    }

    #[test]
    fn test_add_chain_params_wire_format() {
        let params = AddChainParams {
            chain_id: chain_id_hex(80002),
            chain_name: "Polygon Amoy".into(),
            native_currency: NativeCurrencyParams {
                name: "MATIC".into(),
                symbol: "MATIC".into(),
                decimals: 18,
            },
            rpc_urls: vec!["https://rpc-amoy.polygon.technology".into()],
            block_explorer_urls: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["chainId"], "0x13882");
        assert_eq!(json["nativeCurrency"]["decimals"], 18);
        assert!(json["blockExplorerUrls"].is_null());
    }

    #[test]
    fn test_error_codes() {
        let rejected = WalletError::Rpc {
            code: USER_REJECTED_REQUEST,
            message: "User rejected the request.".into(),
        };
        assert!(rejected.is_user_rejection());
        assert!(!rejected.is_unrecognized_chain());
        assert_eq!(WalletError::Unavailable.code(), None);
    }
}
