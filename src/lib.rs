//! ArcFX - 跨链稳定币兑换控制台
//!
//! 连接本地钱包、同步网络、读取余额、估算桥费用并提交兑换交易

pub mod api;
pub mod app_state;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod error;
pub mod error_map;
pub mod infrastructure;
pub mod service;
pub mod utils;
pub mod wallet;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{ChainConfig, ChainKey, ChainRegistry, TokenSymbol},
        error::{AppError, AppErrorCode},
        service::SwapConsole,
    };
}
