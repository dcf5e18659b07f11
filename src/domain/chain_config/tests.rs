//! 链注册表测试

use super::*;

fn contracts(usdc: Option<&str>, bridge: Option<&str>) -> ContractsConfig {
    ContractsConfig {
        usdc_address: usdc.map(addr),
        swap_bridge_address: bridge.map(addr),
        local_chain_id: 31337,
        local_rpc_url: "http://127.0.0.1:8545".to_string(),
    }
}

const LOCAL_USDC: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const LOCAL_BRIDGE: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

#[test]
fn test_chain_registry() {
    let registry = ChainRegistry::new(&contracts(None, None), true);

    let arc = registry.get(ChainKey::ArcTestnet).unwrap();
    assert_eq!(arc.chain_id, 5042002);
    assert_eq!(arc.native_currency.decimals, 6);

    let amoy = registry.get_by_chain_id(80002).unwrap();
    assert_eq!(amoy.key, ChainKey::PolygonAmoy);

    // 开发模式下 Localhost 排在最前
    assert_eq!(registry.list_all()[0].key, ChainKey::Localhost);
}

#[test]
fn test_localhost_hidden_outside_development() {
    let registry = ChainRegistry::new(&contracts(Some(LOCAL_USDC), Some(LOCAL_BRIDGE)), false);
    assert!(!registry.contains(ChainKey::Localhost));
    assert_eq!(registry.list_all().len(), 3);
}

#[test]
fn test_token_resolution_for_every_pair() {
    let registry = ChainRegistry::new(&contracts(Some(LOCAL_USDC), Some(LOCAL_BRIDGE)), true);

    for chain in registry.list_all() {
        for token in [TokenSymbol::USDC, TokenSymbol::EURC] {
            let resolved = registry.resolve_token_address(chain.key, token);
            let valid = chain.supported_tokens().contains(&token);
            assert_eq!(resolved.is_some(), valid, "{} / {}", chain.key, token);
            if let Some(address) = resolved {
                assert!(!address.is_zero());
            }
        }
    }

    // EURC 只在 Arc Testnet 上存在
    assert!(registry
        .resolve_token_address(ChainKey::EthereumSepolia, TokenSymbol::EURC)
        .is_none());
    assert_eq!(
        registry.resolve_token_address(ChainKey::ArcTestnet, TokenSymbol::EURC),
        Some(addr(ARC_EURC))
    );
}

#[test]
fn test_unconfigured_localhost_has_no_addresses() {
    let registry = ChainRegistry::new(&contracts(None, None), true);
    assert!(registry
        .resolve_token_address(ChainKey::Localhost, TokenSymbol::USDC)
        .is_none());
    assert!(registry.bridge_address(ChainKey::Localhost).is_none());
}

#[test]
fn test_add_chain_params_from_descriptor() {
    let registry = ChainRegistry::new(&contracts(None, None), true);

    let arc = registry.get(ChainKey::ArcTestnet).unwrap().add_chain_params();
    assert_eq!(arc.chain_id, "0x4cef52");
    assert_eq!(arc.chain_name, "Arc Testnet");
    assert_eq!(arc.native_currency.symbol, "USDC");
    assert_eq!(
        arc.block_explorer_urls,
        Some(vec!["https://testnet.arcscan.app".to_string()])
    );

    let local = registry.get(ChainKey::Localhost).unwrap().add_chain_params();
    assert_eq!(local.chain_id, "0x7a69");
    assert_eq!(local.block_explorer_urls, None);
}

#[test]
fn test_chain_key_parsing() {
    assert_eq!("Arc_Testnet".parse::<ChainKey>(), Ok(ChainKey::ArcTestnet));
    assert_eq!("polygon_amoy".parse::<ChainKey>(), Ok(ChainKey::PolygonAmoy));
    assert!("Solana".parse::<ChainKey>().is_err());
    assert_eq!("eurc".parse::<TokenSymbol>(), Ok(TokenSymbol::EURC));
}

#[test]
fn test_validate_configs() {
    let registry = ChainRegistry::new(&contracts(Some(LOCAL_USDC), Some(LOCAL_BRIDGE)), true);
    assert!(registry.validate_configs().is_ok());

    let mut clashing = ChainRegistry::new(&contracts(None, None), false);
    let mut dup = clashing.get(ChainKey::ArcTestnet).unwrap().clone();
    dup.key = ChainKey::Localhost;
    clashing.register(dup);
    let errors = clashing.validate_configs().unwrap_err();
    assert!(errors.iter().any(|e| e.contains("Duplicate chain_id")));
}

#[test]
fn test_tx_url() {
    let registry = ChainRegistry::new(&contracts(None, None), true);
    let sepolia = registry.get(ChainKey::EthereumSepolia).unwrap();
    assert_eq!(
        sepolia.tx_url("0xabc").as_deref(),
        Some("https://sepolia.etherscan.io/tx/0xabc")
    );
    assert!(registry.get(ChainKey::Localhost).unwrap().tx_url("0xabc").is_none());
}
