//! 底层错误 -> 面向用户的 AppError
//!
//! 钱包错误和合约调用错误在这里统一归类，服务层不直接拼接文案。

use std::collections::BTreeMap;

use crate::{
    contracts::ContractCallError,
    domain::chain_config::ChainConfig,
    error::{AppError, AppErrorCode},
    wallet::WalletError,
};

/// 错误码 -> 默认文案，供前端对齐
pub fn error_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("no_provider", "Please install MetaMask or another Web3 wallet"),
        ("user_rejected", "The request was rejected in the wallet"),
        ("no_accounts", "No accounts found"),
        ("not_connected", "Please connect your wallet first"),
        ("wallet_request_failed", "The wallet request failed"),
        ("switch_timeout", "Timed out waiting for the network switch"),
        ("network_mismatch", "Please switch to the selected network"),
        ("chain_not_supported", "The selected chain is not supported"),
        ("token_not_configured", "Token address not found"),
        ("rpc_error", "Network error"),
        ("contract_reverted", "Contract error"),
        ("transaction_failed", "Transaction failed"),
        ("invalid_amount", "Please enter a valid amount"),
        ("insufficient_balance", "Insufficient balance"),
        ("contracts_not_configured", "Localhost contracts not configured"),
        ("demo_mode", "This is a demo interface"),
        ("swap_in_progress", "A swap is already in progress"),
        ("bad_request", "Invalid request"),
        ("not_found", "Resource not found"),
        ("internal", "Internal error"),
    ])
}

/// 钱包请求失败。`action` 用作文案前缀，例如 "Failed to connect wallet"
pub fn map_wallet_error(err: &WalletError, action: &str) -> AppError {
    match err {
        WalletError::Unavailable | WalletError::Transport(_) => AppError::no_provider(),
        WalletError::Rpc { message, .. } if err.is_user_rejection() => {
            AppError::user_rejected(format!("{}: {}", action, message))
        }
        WalletError::Rpc { message, .. } => {
            AppError::wallet_request_failed(format!("{}: {}", action, message))
        }
    }
}

/// 余额读取失败时的展示文案
pub fn describe_read_error(err: &ContractCallError, chain: &ChainConfig) -> String {
    match err {
        ContractCallError::Network(_) => format!(
            "Network error: Please make sure you're connected to {}",
            chain.name
        ),
        ContractCallError::Reverted { reason } => format!(
            "Contract error: {}",
            reason.as_deref().unwrap_or("execution reverted")
        ),
        ContractCallError::Rpc { message, .. } if !message.is_empty() => message.clone(),
        ContractCallError::Decode(message) | ContractCallError::Dropped(message)
            if !message.is_empty() =>
        {
            message.clone()
        }
        _ => "Failed to load balance".to_string(),
    }
}

/// 只读调用失败
pub fn map_read_error(err: &ContractCallError, chain: &ChainConfig) -> AppError {
    let code = match err {
        ContractCallError::Reverted { .. } => AppErrorCode::ContractReverted,
        _ => AppErrorCode::RpcError,
    };
    AppError::new(code, describe_read_error(err, chain))
}

/// 交易提交/确认失败
pub fn map_transaction_error(err: &ContractCallError) -> AppError {
    let detail = match err {
        ContractCallError::Reverted {
            reason: Some(reason),
        } => reason.clone(),
        ContractCallError::Rpc { message, .. } => message.clone(),
        other => other.to_string(),
    };
    AppError::transaction_failed(format!("Transaction failed: {}", detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ContractsConfig,
        domain::chain_config::{ChainKey, ChainRegistry},
        wallet::USER_REJECTED_REQUEST,
    };

    fn arc() -> ChainConfig {
        let contracts = ContractsConfig {
            usdc_address: None,
            swap_bridge_address: None,
            local_chain_id: 31337,
            local_rpc_url: "http://127.0.0.1:8545".into(),
        };
        ChainRegistry::new(&contracts, false)
            .get(ChainKey::ArcTestnet)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_read_error_messages() {
        let chain = arc();
        assert_eq!(
            describe_read_error(&ContractCallError::Network("refused".into()), &chain),
            "Network error: Please make sure you're connected to Arc Testnet"
        );
        assert_eq!(
            describe_read_error(
                &ContractCallError::Reverted {
                    reason: Some("paused".into())
                },
                &chain
            ),
            "Contract error: paused"
        );
        assert_eq!(
            describe_read_error(
                &ContractCallError::Rpc {
                    code: -32000,
                    message: "header not found".into()
                },
                &chain
            ),
            "header not found"
        );
        assert_eq!(
            describe_read_error(&ContractCallError::Decode(String::new()), &chain),
            "Failed to load balance"
        );
    }

    #[test]
    fn test_read_error_codes() {
        let chain = arc();
        let err = map_read_error(&ContractCallError::Reverted { reason: None }, &chain);
        assert_eq!(err.code, AppErrorCode::ContractReverted);
        let err = map_read_error(&ContractCallError::Network("x".into()), &chain);
        assert_eq!(err.code, AppErrorCode::RpcError);
    }

    #[test]
    fn test_wallet_error_mapping() {
        let rejected = WalletError::Rpc {
            code: USER_REJECTED_REQUEST,
            message: "User rejected the request.".into(),
        };
        let err = map_wallet_error(&rejected, "Failed to connect wallet");
        assert_eq!(err.code, AppErrorCode::UserRejected);
        assert_eq!(
            err.message,
            "Failed to connect wallet: User rejected the request."
        );

        let err = map_wallet_error(&WalletError::Transport("refused".into()), "x");
        assert_eq!(err.code, AppErrorCode::NoProvider);
    }

    #[test]
    fn test_transaction_error_uses_revert_reason() {
        let err = map_transaction_error(&ContractCallError::Reverted {
            reason: Some("Amount below minimum".into()),
        });
        assert_eq!(err.message, "Transaction failed: Amount below minimum");
    }

    #[test]
    fn test_error_map_covers_codes() {
        let map = error_map();
        assert!(map.contains_key("insufficient_balance"));
        assert!(map.contains_key("switch_timeout"));
    }
}
