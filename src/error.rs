use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// 错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    // 基础错误码
    BadRequest,
    NotFound,
    Internal,

    // 钱包连接
    NoProvider,
    UserRejected,
    NoAccounts,
    NotConnected,
    WalletRequestFailed,
    SwitchTimeout,

    // 网络
    NetworkMismatch,
    ChainNotSupported,

    // 合约调用
    TokenNotConfigured,
    RpcError,
    ContractReverted,
    TransactionFailed,

    // 校验
    InvalidAmount,
    InsufficientBalance,
    ContractsNotConfigured,
    DemoMode,
    SwapInProgress,
}

/// 错误分类（决定前端的展示方式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Connectivity,
    NetworkMismatch,
    ContractCall,
    Validation,
    Internal,
}

/// 展示方式：阻塞式弹窗 或 行内状态文本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    Dialog,
    Inline,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Internal => "internal",
            AppErrorCode::NoProvider => "no_provider",
            AppErrorCode::UserRejected => "user_rejected",
            AppErrorCode::NoAccounts => "no_accounts",
            AppErrorCode::NotConnected => "not_connected",
            AppErrorCode::WalletRequestFailed => "wallet_request_failed",
            AppErrorCode::SwitchTimeout => "switch_timeout",
            AppErrorCode::NetworkMismatch => "network_mismatch",
            AppErrorCode::ChainNotSupported => "chain_not_supported",
            AppErrorCode::TokenNotConfigured => "token_not_configured",
            AppErrorCode::RpcError => "rpc_error",
            AppErrorCode::ContractReverted => "contract_reverted",
            AppErrorCode::TransactionFailed => "transaction_failed",
            AppErrorCode::InvalidAmount => "invalid_amount",
            AppErrorCode::InsufficientBalance => "insufficient_balance",
            AppErrorCode::ContractsNotConfigured => "contracts_not_configured",
            AppErrorCode::DemoMode => "demo_mode",
            AppErrorCode::SwapInProgress => "swap_in_progress",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppErrorCode::NoProvider
            | AppErrorCode::UserRejected
            | AppErrorCode::NoAccounts
            | AppErrorCode::NotConnected
            | AppErrorCode::WalletRequestFailed
            | AppErrorCode::SwitchTimeout => ErrorCategory::Connectivity,
            AppErrorCode::NetworkMismatch => ErrorCategory::NetworkMismatch,
            AppErrorCode::TokenNotConfigured
            | AppErrorCode::RpcError
            | AppErrorCode::ContractReverted
            | AppErrorCode::TransactionFailed => ErrorCategory::ContractCall,
            AppErrorCode::BadRequest
            | AppErrorCode::ChainNotSupported
            | AppErrorCode::InvalidAmount
            | AppErrorCode::InsufficientBalance
            | AppErrorCode::ContractsNotConfigured
            | AppErrorCode::DemoMode
            | AppErrorCode::SwapInProgress => ErrorCategory::Validation,
            AppErrorCode::NotFound | AppErrorCode::Internal => ErrorCategory::Internal,
        }
    }

    fn status(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Connectivity => match self {
                AppErrorCode::NoProvider => StatusCode::SERVICE_UNAVAILABLE,
                AppErrorCode::SwitchTimeout => StatusCode::GATEWAY_TIMEOUT,
                AppErrorCode::WalletRequestFailed => StatusCode::BAD_GATEWAY,
                _ => StatusCode::UNAUTHORIZED,
            },
            ErrorCategory::NetworkMismatch => StatusCode::CONFLICT,
            ErrorCategory::ContractCall => StatusCode::BAD_GATEWAY,
            ErrorCategory::Internal => match self {
                AppErrorCode::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl ErrorCategory {
    pub fn presentation(&self) -> Presentation {
        match self {
            ErrorCategory::Connectivity | ErrorCategory::Validation | ErrorCategory::Internal => {
                Presentation::Dialog
            }
            ErrorCategory::NetworkMismatch | ErrorCategory::ContractCall => Presentation::Inline,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    category: ErrorCategory,
    presentation: Presentation,
    trace_id: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let category = self.category();
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            category,
            presentation: category.presentation(),
            trace_id: self.trace_id.as_deref(),
        };
        (self.code.status(), Json(body)).into_response()
    }
}

impl AppError {
    pub fn new(code: AppErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            trace_id: None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::BadRequest, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Internal, msg)
    }

    // 钱包连接
    pub fn no_provider() -> Self {
        Self::new(
            AppErrorCode::NoProvider,
            "Please install MetaMask or another Web3 wallet",
        )
    }

    pub fn user_rejected(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::UserRejected, msg)
    }

    pub fn no_accounts() -> Self {
        Self::new(AppErrorCode::NoAccounts, "No accounts found")
    }

    pub fn not_connected() -> Self {
        Self::new(AppErrorCode::NotConnected, "Please connect your wallet first")
    }

    pub fn wallet_request_failed(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::WalletRequestFailed, msg)
    }

    pub fn switch_timeout(chain_name: &str, chain_id: u64) -> Self {
        Self::new(
            AppErrorCode::SwitchTimeout,
            format!(
                "Timed out waiting for the wallet to switch to {} (Chain ID: {})",
                chain_name, chain_id
            ),
        )
    }

    // 网络
    pub fn network_mismatch(chain_name: &str, chain_id: u64) -> Self {
        Self::new(
            AppErrorCode::NetworkMismatch,
            format!("Please switch to {} (Chain ID: {})", chain_name, chain_id),
        )
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ChainNotSupported, msg)
    }

    // 合约调用
    pub fn token_not_configured(token: &str) -> Self {
        Self::new(
            AppErrorCode::TokenNotConfigured,
            format!("Token address not found for {}", token),
        )
    }

    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::RpcError, msg)
    }

    pub fn contract_reverted(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ContractReverted, msg)
    }

    pub fn transaction_failed(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::TransactionFailed, msg)
    }

    // 校验
    pub fn invalid_amount() -> Self {
        Self::new(AppErrorCode::InvalidAmount, "Please enter a valid amount")
    }

    pub fn insufficient_balance() -> Self {
        Self::new(AppErrorCode::InsufficientBalance, "Insufficient balance")
    }

    pub fn contracts_not_configured() -> Self {
        Self::new(
            AppErrorCode::ContractsNotConfigured,
            "Localhost contracts not configured. Please set ARCFX_USDC_ADDRESS and ARCFX_SWAP_BRIDGE_ADDRESS",
        )
    }

    pub fn demo_mode() -> Self {
        Self::new(
            AppErrorCode::DemoMode,
            "This is a demo interface. Smart contracts need to be deployed to testnet for real transactions.",
        )
    }

    pub fn swap_in_progress() -> Self {
        Self::new(AppErrorCode::SwapInProgress, "A swap is already in progress")
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON serialization error: {}", err))
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_taxonomy() {
        assert_eq!(AppError::no_provider().category(), ErrorCategory::Connectivity);
        assert_eq!(
            AppError::network_mismatch("Arc Testnet", 5042002).category(),
            ErrorCategory::NetworkMismatch
        );
        assert_eq!(
            AppError::contract_reverted("x").category(),
            ErrorCategory::ContractCall
        );
        assert_eq!(AppError::insufficient_balance().category(), ErrorCategory::Validation);
        assert_eq!(
            AppError::switch_timeout("Polygon Amoy", 80002).category(),
            ErrorCategory::Connectivity
        );
    }

    #[test]
    fn test_presentation() {
        assert_eq!(
            ErrorCategory::Validation.presentation(),
            Presentation::Dialog
        );
        assert_eq!(
            ErrorCategory::NetworkMismatch.presentation(),
            Presentation::Inline
        );
    }

    #[test]
    fn test_network_mismatch_message() {
        let err = AppError::network_mismatch("Arc Testnet", 5042002);
        assert_eq!(err.message, "Please switch to Arc Testnet (Chain ID: 5042002)");
        assert_eq!(err.to_string(), err.message);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppErrorCode::InvalidAmount.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppErrorCode::NoProvider.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppErrorCode::NetworkMismatch.status(), StatusCode::CONFLICT);
    }
}
