//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{net::SocketAddr, path::Path, str::FromStr};

use anyhow::{Context, Result};
use ethers::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub fees: FeeConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// 开发模式：暴露 Localhost 链
    pub development: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

/// 注入式钱包配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// 钱包暴露的 EIP-1193 JSON-RPC 端点；为空表示没有钱包
    pub rpc_url: Option<String>,
    /// 等待钱包确认网络切换的上限
    pub switch_timeout_ms: u64,
    /// 轮询 eth_chainId / eth_accounts 的间隔
    pub poll_interval_ms: u64,
}

/// 本地开发链合约配置（由部署脚本输出）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub usdc_address: Option<Address>,
    pub swap_bridge_address: Option<Address>,
    pub local_chain_id: u64,
    pub local_rpc_url: String,
}

/// 演示模式下的启发式费用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    pub base_fee: Decimal,
    pub bridge_fee_rate: Decimal,
}

fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn env_address(keys: &[&str]) -> Option<Address> {
    let raw = env_first(keys)?;
    match raw.parse::<Address>() {
        Ok(address) => Some(address),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "Ignoring invalid contract address from env");
            None
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// 绑定地址是否为回环地址（等价于浏览器里的 localhost 判断）
pub fn is_loopback_bind(bind_addr: &str) -> bool {
    if let Ok(addr) = SocketAddr::from_str(bind_addr) {
        return addr.ip().is_loopback();
    }
    bind_addr.starts_with("localhost")
}

impl Default for ServerConfig {
    fn default() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8089".into());
        let development =
            env_flag("ARCFX_DEVELOPMENT").unwrap_or_else(|| is_loopback_bind(&bind_addr));
        Self {
            bind_addr,
            development,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            enable_file_logging: env_flag("LOG_FILE_ENABLED").unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: match std::env::var("ARCFX_WALLET_RPC") {
                Ok(v) if v.trim().is_empty() || v == "none" => None,
                Ok(v) => Some(v),
                Err(_) => Some("http://127.0.0.1:1248".into()),
            },
            switch_timeout_ms: std::env::var("ARCFX_SWITCH_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
            poll_interval_ms: std::env::var("ARCFX_WALLET_POLL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
        }
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            usdc_address: env_address(&["ARCFX_USDC_ADDRESS", "NEXT_PUBLIC_USDC_ADDRESS"]),
            swap_bridge_address: env_address(&[
                "ARCFX_SWAP_BRIDGE_ADDRESS",
                "NEXT_PUBLIC_SWAP_BRIDGE_ADDRESS",
            ]),
            local_chain_id: env_first(&["ARCFX_LOCAL_CHAIN_ID", "NEXT_PUBLIC_LOCAL_CHAIN_ID"])
                .and_then(|s| s.parse().ok())
                .unwrap_or(31337),
            local_rpc_url: env_first(&["ARCFX_LOCAL_RPC", "NEXT_PUBLIC_LOCAL_RPC"])
                .unwrap_or_else(|| "http://127.0.0.1:8545".into()),
        }
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            base_fee: Decimal::new(1, 2), // 0.01
            bridge_fee_rate: Decimal::new(1, 3), // 0.1%
        }
    }
}

impl ContractsConfig {
    /// 两个合约地址都已配置
    pub fn is_configured(&self) -> bool {
        self.usdc_address.is_some() && self.swap_bridge_address.is_some()
    }
}

impl WalletConfig {
    pub fn switch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.switch_timeout_ms)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            wallet: WalletConfig::default(),
            contracts: ContractsConfig::default(),
            fees: FeeConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            } else {
                tracing::warn!(path = ?path.as_ref(), "Config file not found, using environment");
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let port_ok = self
            .server
            .bind_addr
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse::<u16>().ok())
            .is_some();
        if !port_ok {
            anyhow::bail!("BIND_ADDR must be in host:port form");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if let Some(url) = &self.wallet.rpc_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("ARCFX_WALLET_RPC must be an http(s) URL");
            }
        }

        if self.wallet.switch_timeout_ms == 0 {
            anyhow::bail!("ARCFX_SWITCH_TIMEOUT_MS must be greater than 0");
        }

        if self.contracts.local_chain_id == 0 {
            anyhow::bail!("ARCFX_LOCAL_CHAIN_ID must be greater than 0");
        }

        if self.fees.base_fee.is_sign_negative() || self.fees.bridge_fee_rate.is_sign_negative() {
            anyhow::bail!("fee parameters must not be negative");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback_bind("127.0.0.1:8089"));
        assert!(is_loopback_bind("localhost:8089"));
        assert!(!is_loopback_bind("0.0.0.0:8089"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_addr = "127.0.0.1:9000"
development = true

[logging]
level = "debug"
format = "json"
enable_file_logging = false

[wallet]
rpc_url = "http://127.0.0.1:1248"
switch_timeout_ms = 3000
poll_interval_ms = 250

[contracts]
usdc_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
swap_bridge_address = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
local_chain_id = 31337
local_rpc_url = "http://127.0.0.1:8545"

[fees]
base_fee = "0.02"
bridge_fee_rate = "0.002"
"#
        )
        .unwrap();

        let config = Config::from_env_and_file(Some(file.path())).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.wallet.switch_timeout_ms, 3000);
        assert!(config.contracts.is_configured());
        assert_eq!(config.fees.base_fee, Decimal::new(2, 2));
    }

    #[test]
    fn test_validate_rejects_bad_log_format() {
        let mut config = Config::from_env().unwrap();
        config.logging.format = "yaml".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::from_env().unwrap();
        config.logging.level = "info".into();
        config.logging.format = "text".into();
        config.wallet.switch_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
