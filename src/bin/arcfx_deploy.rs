//! 把 MockUSDC 和 SwapBridge 部署到本地开发链，并打印服务端需要的环境变量
//!
//! 用法: arcfx_deploy [--rpc-url http://127.0.0.1:8545] [--artifacts artifacts/contracts]

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use arcfx::{contracts::Erc20Contract, infrastructure::EthersTransport, utils::format_amount};
use ethers::{
    abi::Abi,
    contract::ContractFactory,
    providers::{Http, Middleware, Provider},
    types::{Address, Bytes},
    utils::format_ether,
};
use serde::Deserialize;

const MOCK_USDC: &str = "MockUSDC";
const SWAP_BRIDGE: &str = "SwapBridge";
const MOCK_USDC_DECIMALS: u8 = 6;

struct Args {
    rpc_url: String,
    artifacts: PathBuf,
}

fn parse_args() -> Args {
    let mut rpc_url = std::env::var("ARCFX_LOCAL_RPC")
        .unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());
    let mut artifacts = PathBuf::from("artifacts/contracts");

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rpc-url" => {
                if let Some(v) = args.next() {
                    rpc_url = v;
                }
            }
            "--artifacts" => {
                if let Some(v) = args.next() {
                    artifacts = PathBuf::from(v);
                }
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
    }

    Args { rpc_url, artifacts }
}

/// Hardhat 编译产物中用到的字段
#[derive(Debug, Deserialize)]
struct HardhatArtifact {
    #[serde(rename = "contractName")]
    contract_name: String,
    abi: Abi,
    bytecode: Bytes,
}

/// 兼容 `<dir>/<Name>.sol/<Name>.json` 和 `<dir>/<Name>.json` 两种布局
fn load_artifact(dir: &Path, name: &str) -> Result<HardhatArtifact> {
    let candidates = [
        dir.join(format!("{name}.sol")).join(format!("{name}.json")),
        dir.join(format!("{name}.json")),
    ];
    let path = candidates
        .iter()
        .find(|p| p.exists())
        .with_context(|| format!("artifact for {} not found under {:?}", name, dir))?;

    let raw = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    let artifact: HardhatArtifact =
        serde_json::from_str(&raw).with_context(|| format!("parse artifact {:?}", path))?;
    if artifact.bytecode.is_empty() {
        anyhow::bail!("{} has no deployable bytecode", artifact.contract_name);
    }
    Ok(artifact)
}

async fn deploy(
    client: Arc<Provider<Http>>,
    artifact: HardhatArtifact,
    owner: Address,
) -> Result<Address> {
    println!("\nDeploying {}...", artifact.contract_name);
    let factory = ContractFactory::new(artifact.abi, artifact.bytecode, client);
    let contract = factory
        .deploy(owner)
        .with_context(|| format!("encode {} constructor", artifact.contract_name))?
        .send()
        .await
        .with_context(|| format!("deploy {}", artifact.contract_name))?;
    let address = contract.address();
    println!("{} deployed to: {:?}", artifact.contract_name, address);
    Ok(address)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();
    println!("Deploying contracts to {}...", args.rpc_url);

    let usdc_artifact = load_artifact(&args.artifacts, MOCK_USDC)?;
    let bridge_artifact = load_artifact(&args.artifacts, SWAP_BRIDGE)?;

    let provider = Provider::<Http>::try_from(args.rpc_url.as_str())
        .with_context(|| format!("invalid rpc url: {}", args.rpc_url))?;
    let chain_id = provider.get_chainid().await.context("query chain id")?;

    let deployer = *provider
        .get_accounts()
        .await
        .context("query node accounts")?
        .first()
        .context("node exposes no unlocked accounts")?;
    println!("Deploying contracts with account: {:?}", deployer);

    let balance = provider
        .get_balance(deployer, None)
        .await
        .context("query deployer balance")?;
    println!("Account balance: {}", format_ether(balance));

    let client = Arc::new(provider.clone().with_sender(deployer));
    let usdc_address = deploy(client.clone(), usdc_artifact, deployer).await?;
    let bridge_address = deploy(client, bridge_artifact, deployer).await?;

    let usdc = Erc20Contract::new(
        usdc_address,
        Arc::new(EthersTransport::new(provider, deployer)),
    );
    let usdc_balance = usdc
        .balance_of(deployer)
        .await
        .context("read deployer USDC balance")?;
    println!(
        "\nDeployer USDC balance: {} mUSDC",
        format_amount(usdc_balance, MOCK_USDC_DECIMALS)
    );

    println!("\n=== Deployment Summary ===");
    println!("MockUSDC Address: {:?}", usdc_address);
    println!("SwapBridge Address: {:?}", bridge_address);
    println!("\nCopy these lines into your .env file:");
    println!("ARCFX_USDC_ADDRESS={:?}", usdc_address);
    println!("ARCFX_SWAP_BRIDGE_ADDRESS={:?}", bridge_address);
    println!("ARCFX_LOCAL_CHAIN_ID={}", chain_id);
    println!("ARCFX_LOCAL_RPC={}", args.rpc_url);

    Ok(())
}
