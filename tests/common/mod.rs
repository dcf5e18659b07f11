//! 测试辅助模块
//! 提供内存钱包、内存链和测试配置

#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use arcfx::{
    config::{Config, ContractsConfig, FeeConfig, LoggingConfig, ServerConfig, WalletConfig},
    contracts::{ContractCallError, ContractTransport, TxOutcome},
    wallet::{AddChainParams, WalletError, WalletEvent, WalletProvider, UNRECOGNIZED_CHAIN},
};
use async_trait::async_trait;
use ethers::{
    abi::{encode, Token},
    types::{Address, Bytes, H256, U256},
    utils::id,
};
use rust_decimal::Decimal;
use tokio::sync::broadcast;

pub const LOCAL_CHAIN_ID: u64 = 31337;
pub const ARC_CHAIN_ID: u64 = 5042002;
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
pub const AMOY_CHAIN_ID: u64 = 80002;

pub fn account() -> Address {
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
}

pub fn usdc_address() -> Address {
    "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap()
}

pub fn bridge_address() -> Address {
    "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".parse().unwrap()
}

/// 1000 USDC（6 位精度）
pub fn thousand_usdc() -> U256 {
    U256::from(1_000_000_000u64)
}

/// 测试配置；`with_contracts` 控制本地合约地址是否已配置
pub fn test_config(with_contracts: bool) -> Config {
    Config {
        server: ServerConfig {
            bind_addr: "127.0.0.1:0".into(),
            development: true,
        },
        logging: LoggingConfig {
            level: "debug".into(),
            format: "text".into(),
            enable_file_logging: false,
            log_file_path: None,
        },
        wallet: WalletConfig {
            rpc_url: None,
            switch_timeout_ms: 500,
            poll_interval_ms: 10,
        },
        contracts: ContractsConfig {
            usdc_address: with_contracts.then(usdc_address),
            swap_bridge_address: with_contracts.then(bridge_address),
            local_chain_id: LOCAL_CHAIN_ID,
            local_rpc_url: "http://127.0.0.1:8545".into(),
        },
        fees: FeeConfig {
            base_fee: Decimal::new(1, 2),
            bridge_fee_rate: Decimal::new(1, 3),
        },
    }
}

// ============ 内存链 ============

/// 所有签名句柄共享的合约状态
#[derive(Debug)]
pub struct ChainState {
    pub balance: U256,
    pub decimals: u8,
    pub allowance: U256,
    pub fee_bps: U256,
    pub min_swap_amount: U256,
    /// 为 true 时 bridgeFeeBps() 读取失败
    pub fee_read_fails: bool,
    /// 设置后 balanceOf 回滚
    pub balance_revert: Option<String>,
    /// 设置后 swap 交易回滚
    pub swap_revert: Option<String>,
    /// 每笔交易上链前的等待
    pub send_delay: Duration,
    pub calls: Vec<(Address, [u8; 4])>,
    pub sends: Vec<(Address, Bytes)>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            balance: thousand_usdc(),
            decimals: 6,
            allowance: U256::zero(),
            fee_bps: U256::from(30u8),
            min_swap_amount: U256::from(1_000_000u64),
            fee_read_fails: false,
            balance_revert: None,
            swap_revert: None,
            send_delay: Duration::ZERO,
            calls: Vec::new(),
            sends: Vec::new(),
        }
    }
}

impl ChainState {
    /// 已发送交易的函数选择器，按发送顺序
    pub fn sent_selectors(&self) -> Vec<[u8; 4]> {
        self.sends.iter().map(|(_, data)| selector_of(data)).collect()
    }
}

fn selector_of(data: &Bytes) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&data[..4]);
    out
}

fn uint_word(value: U256) -> Bytes {
    Bytes::from(encode(&[Token::Uint(value)]))
}

pub struct MockSigner {
    account: Address,
    chain_id: Arc<AtomicU64>,
    state: Arc<Mutex<ChainState>>,
}

impl MockSigner {
    pub fn new(account: Address, chain_id: Arc<AtomicU64>, state: Arc<Mutex<ChainState>>) -> Self {
        Self {
            account,
            chain_id,
            state,
        }
    }

    /// 固定在某条链上的独立句柄
    pub fn fixed(chain_id: u64, state: Arc<Mutex<ChainState>>) -> Arc<dyn ContractTransport> {
        Arc::new(Self::new(
            account(),
            Arc::new(AtomicU64::new(chain_id)),
            state,
        ))
    }
}

#[async_trait]
impl ContractTransport for MockSigner {
    fn account(&self) -> Address {
        self.account
    }

    async fn chain_id(&self) -> Result<u64, ContractCallError> {
        Ok(self.chain_id.load(Ordering::SeqCst))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ContractCallError> {
        let sel = selector_of(&data);
        let mut state = self.state.lock().unwrap();
        state.calls.push((to, sel));

        if sel == id("balanceOf(address)") {
            if let Some(reason) = state.balance_revert.clone() {
                return Err(ContractCallError::Reverted {
                    reason: Some(reason),
                });
            }
            Ok(uint_word(state.balance))
        } else if sel == id("decimals()") {
            Ok(uint_word(U256::from(state.decimals)))
        } else if sel == id("allowance(address,address)") {
            Ok(uint_word(state.allowance))
        } else if sel == id("bridgeFeeBps()") {
            if state.fee_read_fails {
                return Err(ContractCallError::Network("connection refused".into()));
            }
            Ok(uint_word(state.fee_bps))
        } else if sel == id("minSwapAmount()") {
            Ok(uint_word(state.min_swap_amount))
        } else {
            Err(ContractCallError::Reverted { reason: None })
        }
    }

    async fn send(&self, to: Address, data: Bytes) -> Result<TxOutcome, ContractCallError> {
        let delay = self.state.lock().unwrap().send_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let sel = selector_of(&data);
        let mut state = self.state.lock().unwrap();
        if sel == id("swap(address,uint256,uint256)") {
            if let Some(reason) = state.swap_revert.clone() {
                return Err(ContractCallError::Reverted {
                    reason: Some(reason),
                });
            }
        }
        if sel == id("approve(address,uint256)") {
            let args = ethers::abi::decode(
                &[
                    ethers::abi::ParamType::Address,
                    ethers::abi::ParamType::Uint(256),
                ],
                &data[4..],
            )
            .unwrap();
            state.allowance = args[1].clone().into_uint().unwrap();
        }

        state.sends.push((to, data));
        let n = state.sends.len() as u64;
        Ok(TxOutcome {
            tx_hash: H256::from_low_u64_be(0x1000 + n),
            block_number: Some(100 + n),
        })
    }
}

// ============ 内存钱包 ============

/// 钱包行为开关
#[derive(Debug, Clone)]
pub struct WalletBehavior {
    /// 收到切换请求后是否真的切换
    pub honor_switch: bool,
    /// 切换后是否推送 chainChanged
    pub emit_events: bool,
    /// 下一次切换请求返回的错误码
    pub switch_error: Option<i64>,
    pub add_error: Option<i64>,
    pub reject_connect: bool,
}

impl Default for WalletBehavior {
    fn default() -> Self {
        Self {
            honor_switch: true,
            emit_events: true,
            switch_error: None,
            add_error: None,
            reject_connect: false,
        }
    }
}

pub struct MockWallet {
    pub chain_id: Arc<AtomicU64>,
    pub accounts: Mutex<Vec<Address>>,
    pub known_chains: Mutex<HashSet<u64>>,
    pub behavior: Mutex<WalletBehavior>,
    pub state: Arc<Mutex<ChainState>>,
    /// 依次记录 "switch:<id>" / "add:<hex id>"
    pub requests: Mutex<Vec<String>>,
    events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    pub fn new(chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            chain_id: Arc::new(AtomicU64::new(chain_id)),
            accounts: Mutex::new(vec![account()]),
            known_chains: Mutex::new(
                [LOCAL_CHAIN_ID, ARC_CHAIN_ID, SEPOLIA_CHAIN_ID]
                    .into_iter()
                    .collect(),
            ),
            behavior: Mutex::new(WalletBehavior::default()),
            state: Arc::new(Mutex::new(ChainState::default())),
            requests: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn with_behavior(self, behavior: WalletBehavior) -> Self {
        *self.behavior.lock().unwrap() = behavior;
        self
    }

    pub fn forget_chain(&self, chain_id: u64) {
        self.known_chains.lock().unwrap().remove(&chain_id);
    }

    pub fn current_chain(&self) -> u64 {
        self.chain_id.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// 模拟用户在钱包里手动操作
    pub fn emit(&self, event: WalletEvent) {
        if let WalletEvent::ChainChanged(id) = event {
            self.chain_id.store(id, Ordering::SeqCst);
        }
        let _ = self.events.send(event);
    }
}

fn rpc_error(code: i64, message: &str) -> WalletError {
    WalletError::Rpc {
        code,
        message: message.to_string(),
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if self.behavior.lock().unwrap().reject_connect {
            return Err(rpc_error(4001, "User rejected the request."));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.current_chain())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("switch:{}", chain_id));

        let behavior = self.behavior.lock().unwrap().clone();
        if let Some(code) = behavior.switch_error {
            return Err(rpc_error(code, "switch failed"));
        }
        if !self.known_chains.lock().unwrap().contains(&chain_id) {
            return Err(rpc_error(
                UNRECOGNIZED_CHAIN,
                "Unrecognized chain ID. Try adding the chain using wallet_addEthereumChain first.",
            ));
        }
        if behavior.honor_switch {
            self.chain_id.store(chain_id, Ordering::SeqCst);
            if behavior.emit_events {
                let _ = self.events.send(WalletEvent::ChainChanged(chain_id));
            }
        }
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), WalletError> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("add:{}", params.chain_id));

        if let Some(code) = self.behavior.lock().unwrap().add_error {
            return Err(rpc_error(code, "add failed"));
        }
        let chain_id = u64::from_str_radix(params.chain_id.trim_start_matches("0x"), 16)
            .map_err(|e| WalletError::Transport(e.to_string()))?;
        self.known_chains.lock().unwrap().insert(chain_id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    async fn signer(&self, account: Address) -> Result<Arc<dyn ContractTransport>, WalletError> {
        Ok(Arc::new(MockSigner::new(
            account,
            self.chain_id.clone(),
            self.state.clone(),
        )))
    }
}
