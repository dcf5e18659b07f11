//! 链配置模块
//!
//! 每条链一份统一的描述（链 ID、RPC、浏览器、原生币、代币地址、桥合约地址），
//! 网络切换和代币解析都只消费这份描述，不再按链名分支。

use std::{fmt, str::FromStr};

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::{
    config::ContractsConfig,
    wallet::{chain_id_hex, AddChainParams, NativeCurrencyParams},
};

/// 链标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainKey {
    #[serde(rename = "Localhost")]
    Localhost,
    #[serde(rename = "Arc_Testnet")]
    ArcTestnet,
    #[serde(rename = "Ethereum_Sepolia")]
    EthereumSepolia,
    #[serde(rename = "Polygon_Amoy")]
    PolygonAmoy,
}

impl ChainKey {
    pub const ALL: [ChainKey; 4] = [
        ChainKey::Localhost,
        ChainKey::ArcTestnet,
        ChainKey::EthereumSepolia,
        ChainKey::PolygonAmoy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainKey::Localhost => "Localhost",
            ChainKey::ArcTestnet => "Arc_Testnet",
            ChainKey::EthereumSepolia => "Ethereum_Sepolia",
            ChainKey::PolygonAmoy => "Polygon_Amoy",
        }
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown chain: {}", s))
    }
}

/// 支持的稳定币
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSymbol {
    USDC,
    EURC,
}

impl TokenSymbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSymbol::USDC => "USDC",
            TokenSymbol::EURC => "EURC",
        }
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenSymbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USDC" => Ok(TokenSymbol::USDC),
            "EURC" => Ok(TokenSymbol::EURC),
            other => Err(format!("Unknown token: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// 链配置（启动时构建，之后只读）
#[derive(Debug, Clone, Serialize)]
pub struct ChainConfig {
    pub key: ChainKey,
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: Option<String>,
    pub native_currency: NativeCurrency,
    /// 每种代币在该链上的合约地址
    pub tokens: Vec<(TokenSymbol, Address)>,
    pub swap_bridge_address: Option<Address>,
    /// Circle CCTP domain
    pub cctp_domain: Option<u32>,
}

impl ChainConfig {
    pub fn token_address(&self, token: TokenSymbol) -> Option<Address> {
        self.tokens
            .iter()
            .find(|(symbol, _)| *symbol == token)
            .map(|(_, address)| *address)
    }

    pub fn supported_tokens(&self) -> Vec<TokenSymbol> {
        self.tokens.iter().map(|(symbol, _)| *symbol).collect()
    }

    /// 生成 `wallet_addEthereumChain` 所需的完整描述
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: chain_id_hex(self.chain_id),
            chain_name: self.name.clone(),
            native_currency: NativeCurrencyParams {
                name: self.native_currency.name.to_string(),
                symbol: self.native_currency.symbol.to_string(),
                decimals: self.native_currency.decimals,
            },
            rpc_urls: vec![self.rpc_url.clone()],
            block_explorer_urls: self.explorer_url.clone().map(|url| vec![url]),
        }
    }

    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

/// Arc Testnet 官方合约地址 (https://docs.arc.network/arc/references/contract-addresses)
const ARC_USDC: &str = "0x3600000000000000000000000000000000000000";
const ARC_EURC: &str = "0x89B50855Aa3bE2F677cD6303Cec089B5F319D72a";
const SEPOLIA_USDC: &str = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238";
const AMOY_USDC: &str = "0x41e94eb019c0762f9bfcf9fb1e58725bfb0e7582";

fn addr(s: &str) -> Address {
    s.parse::<Address>().expect("valid address literal")
}

/// 链配置注册表
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    /// 创建预配置的注册表
    ///
    /// `development` 为 false 时不暴露 Localhost 链
    pub fn new(contracts: &ContractsConfig, development: bool) -> Self {
        let mut registry = Self { chains: Vec::new() };

        if development {
            registry.register(Self::localhost(contracts));
        }
        registry.register_default_chains();
        registry
    }

    fn localhost(contracts: &ContractsConfig) -> ChainConfig {
        let tokens = contracts
            .usdc_address
            .map(|address| vec![(TokenSymbol::USDC, address)])
            .unwrap_or_default();

        ChainConfig {
            key: ChainKey::Localhost,
            name: "Localhost".to_string(),
            chain_id: contracts.local_chain_id,
            rpc_url: contracts.local_rpc_url.clone(),
            explorer_url: None,
            native_currency: NativeCurrency {
                name: "ETH",
                symbol: "ETH",
                decimals: 18,
            },
            tokens,
            swap_bridge_address: contracts.swap_bridge_address,
            cctp_domain: None,
        }
    }

    fn register_default_chains(&mut self) {
        self.register(ChainConfig {
            key: ChainKey::ArcTestnet,
            name: "Arc Testnet".to_string(),
            chain_id: 5042002,
            rpc_url: "https://rpc.testnet.arc.network".to_string(),
            explorer_url: Some("https://testnet.arcscan.app".to_string()),
            // Arc 的原生 gas 代币就是 USDC
            native_currency: NativeCurrency {
                name: "USDC",
                symbol: "USDC",
                decimals: 6,
            },
            tokens: vec![
                (TokenSymbol::USDC, addr(ARC_USDC)),
                (TokenSymbol::EURC, addr(ARC_EURC)),
            ],
            swap_bridge_address: None,
            cctp_domain: Some(26),
        });

        self.register(ChainConfig {
            key: ChainKey::EthereumSepolia,
            name: "Ethereum Sepolia".to_string(),
            chain_id: 11155111,
            rpc_url: "https://sepolia.infura.io/v3/".to_string(),
            explorer_url: Some("https://sepolia.etherscan.io".to_string()),
            native_currency: NativeCurrency {
                name: "ETH",
                symbol: "ETH",
                decimals: 18,
            },
            tokens: vec![(TokenSymbol::USDC, addr(SEPOLIA_USDC))],
            swap_bridge_address: None,
            cctp_domain: Some(0),
        });

        self.register(ChainConfig {
            key: ChainKey::PolygonAmoy,
            name: "Polygon Amoy".to_string(),
            chain_id: 80002,
            rpc_url: "https://rpc-amoy.polygon.technology".to_string(),
            explorer_url: Some("https://www.oklink.com/amoy".to_string()),
            native_currency: NativeCurrency {
                name: "MATIC",
                symbol: "MATIC",
                decimals: 18,
            },
            tokens: vec![(TokenSymbol::USDC, addr(AMOY_USDC))],
            swap_bridge_address: None,
            cctp_domain: Some(7),
        });
    }

    /// 注册链配置（同 key 覆盖）
    pub fn register(&mut self, config: ChainConfig) {
        self.chains.retain(|c| c.key != config.key);
        self.chains.push(config);
    }

    pub fn get(&self, key: ChainKey) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.key == key)
    }

    pub fn get_by_chain_id(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    pub fn contains(&self, key: ChainKey) -> bool {
        self.get(key).is_some()
    }

    /// 按注册顺序列出所有可选链
    pub fn list_all(&self) -> &[ChainConfig] {
        &self.chains
    }

    /// 解析 (链, 代币) 对应的合约地址；组合无效时返回 None
    pub fn resolve_token_address(&self, key: ChainKey, token: TokenSymbol) -> Option<Address> {
        self.get(key)?.token_address(token)
    }

    pub fn bridge_address(&self, key: ChainKey) -> Option<Address> {
        self.get(key)?.swap_bridge_address
    }

    /// 验证链配置完整性
    pub fn validate_configs(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for config in &self.chains {
            if config.chain_id == 0 {
                errors.push(format!("Chain {} has invalid chain_id: 0", config.name));
            }
            if config.name.is_empty() {
                errors.push(format!("Chain {} has empty name", config.key));
            }
            if config.rpc_url.is_empty() {
                errors.push(format!("Chain {} has empty rpc_url", config.name));
            }
            if let Some((symbol, _)) = config
                .tokens
                .iter()
                .find(|(_, address)| address.is_zero())
            {
                errors.push(format!(
                    "Chain {} has zero address for {}",
                    config.name, symbol
                ));
            }
        }

        for (i, a) in self.chains.iter().enumerate() {
            if self.chains[i + 1..].iter().any(|b| b.chain_id == a.chain_id) {
                errors.push(format!("Duplicate chain_id: {}", a.chain_id));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests;
