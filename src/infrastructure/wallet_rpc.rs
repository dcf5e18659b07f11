//! 通过 JSON-RPC 访问的本地钱包（桌面钱包 / 浏览器扩展桥接端点）
//!
//! EIP-1193 的 request 方法直接映射成 JSON-RPC 调用；`chainChanged` /
//! `accountsChanged` 通知由后台轮询合成，经 broadcast 通道分发。

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider, ProviderError, RpcError},
    types::Address,
};
use serde_json::json;
use tokio::{sync::broadcast, task::JoinHandle, time::MissedTickBehavior};

use crate::{
    contracts::ContractTransport,
    infrastructure::evm_transport::EthersTransport,
    wallet::{chain_id_hex, AddChainParams, WalletError, WalletEvent, WalletProvider},
};

const EVENT_CHANNEL_CAPACITY: usize = 32;

pub struct RpcWalletProvider {
    provider: Provider<Http>,
    events: broadcast::Sender<WalletEvent>,
    poll_interval: Duration,
}

impl RpcWalletProvider {
    pub fn connect(url: &str, poll_interval: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url)
            .with_context(|| format!("Invalid wallet RPC url: {}", url))?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            provider,
            events,
            poll_interval,
        })
    }

    /// 启动后台轮询；provider 被释放后任务自行退出
    pub fn spawn_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut state = WatchState::default();

            loop {
                ticker.tick().await;
                let Some(wallet) = weak.upgrade() else {
                    tracing::debug!("Wallet provider dropped, stopping watcher");
                    break;
                };
                wallet.poll_once(&mut state).await;
            }
        })
    }

    async fn poll_once(&self, state: &mut WatchState) {
        match self.provider.get_chainid().await {
            Ok(id) => {
                if let Some(event) = state.observe_chain(id.as_u64()) {
                    self.publish(event);
                }
            }
            Err(e) => tracing::debug!(error = %e, "Wallet chain poll failed"),
        }

        match self.provider.get_accounts().await {
            Ok(accounts) => {
                if let Some(event) = state.observe_accounts(accounts) {
                    self.publish(event);
                }
            }
            Err(e) => tracing::debug!(error = %e, "Wallet accounts poll failed"),
        }
    }

    fn publish(&self, event: WalletEvent) {
        tracing::info!(?event, "Wallet event");
        // 没有订阅者时 send 返回 Err，忽略即可
        let _ = self.events.send(event);
    }
}

/// 上一次观察到的钱包状态；首次观察只记录，不产生事件
#[derive(Debug, Default)]
struct WatchState {
    chain_id: Option<u64>,
    accounts: Option<Vec<Address>>,
}

impl WatchState {
    fn observe_chain(&mut self, chain_id: u64) -> Option<WalletEvent> {
        match self.chain_id.replace(chain_id) {
            Some(prev) if prev != chain_id => Some(WalletEvent::ChainChanged(chain_id)),
            _ => None,
        }
    }

    fn observe_accounts(&mut self, accounts: Vec<Address>) -> Option<WalletEvent> {
        match self.accounts.replace(accounts.clone()) {
            Some(prev) if prev != accounts => Some(WalletEvent::AccountsChanged(accounts)),
            _ => None,
        }
    }
}

fn wallet_error(err: ProviderError) -> WalletError {
    match err.as_error_response() {
        Some(resp) => WalletError::Rpc {
            code: resp.code,
            message: resp.message.clone(),
        },
        None => WalletError::Transport(err.to_string()),
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
            .map_err(wallet_error)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let id = self.provider.get_chainid().await.map_err(wallet_error)?;
        Ok(id.as_u64())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        self.provider
            .request::<_, serde_json::Value>(
                "wallet_switchEthereumChain",
                [json!({ "chainId": chain_id_hex(chain_id) })],
            )
            .await
            .map_err(wallet_error)?;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), WalletError> {
        self.provider
            .request::<_, serde_json::Value>("wallet_addEthereumChain", [params])
            .await
            .map_err(wallet_error)?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    async fn signer(&self, account: Address) -> Result<Arc<dyn ContractTransport>, WalletError> {
        Ok(Arc::new(EthersTransport::new(self.provider.clone(), account)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_silent() {
        let mut state = WatchState::default();
        assert_eq!(state.observe_chain(5042002), None);
        assert_eq!(state.observe_chain(5042002), None);
        assert_eq!(
            state.observe_chain(80002),
            Some(WalletEvent::ChainChanged(80002))
        );
    }

    #[test]
    fn test_account_changes() {
        let a = Address::repeat_byte(0x11);
        let b = Address::repeat_byte(0x22);
        let mut state = WatchState::default();
        assert_eq!(state.observe_accounts(vec![a]), None);
        assert_eq!(state.observe_accounts(vec![a]), None);
        assert_eq!(
            state.observe_accounts(vec![b]),
            Some(WalletEvent::AccountsChanged(vec![b]))
        );
        assert_eq!(
            state.observe_accounts(vec![]),
            Some(WalletEvent::AccountsChanged(vec![]))
        );
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        assert!(RpcWalletProvider::connect("not a url", Duration::from_millis(10)).is_err());
    }
}
