//! Domain 模块
//!
//! 链描述、钱包会话和兑换相关的领域模型

pub mod chain_config;
pub mod session;
pub mod swap;

pub use chain_config::{ChainConfig, ChainKey, ChainRegistry, TokenSymbol};
pub use session::{Session, SessionState};
pub use swap::{
    BalanceView, FeeEstimate, FeeKind, FormUpdate, OperatingMode, SwapForm, SwapResult, SwapStage,
};
