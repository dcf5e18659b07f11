//! 网络同步
//!
//! 让钱包切到选中的源链：钱包不认识该链时先添加再重试一次切换，
//! 然后等待钱包确认（chainChanged 事件或轮询到目标链 ID），
//! 整个等待受超时约束。

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    domain::chain_config::ChainConfig,
    error::AppError,
    error_map::map_wallet_error,
    wallet::{WalletEvent, WalletProvider},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// 钱包已经在目标链上，没有发出任何请求
    AlreadyOnChain,
    /// 已切换；`added` 表示先执行了 wallet_addEthereumChain
    Switched { added: bool },
}

#[derive(Debug, Clone)]
pub struct NetworkSynchronizer {
    switch_timeout: Duration,
    poll_interval: Duration,
}

impl NetworkSynchronizer {
    pub fn new(switch_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            switch_timeout,
            poll_interval,
        }
    }

    pub async fn ensure_chain(
        &self,
        wallet: &dyn WalletProvider,
        chain: &ChainConfig,
    ) -> Result<SyncOutcome, AppError> {
        let current = wallet
            .chain_id()
            .await
            .map_err(|e| map_wallet_error(&e, "Failed to read wallet network"))?;
        if current == chain.chain_id {
            return Ok(SyncOutcome::AlreadyOnChain);
        }

        tracing::info!(
            from = current,
            to = chain.chain_id,
            chain = %chain.name,
            "Requesting wallet network switch"
        );

        // 先订阅再切换，避免错过切换完成的通知
        let mut events = wallet.subscribe();
        let added = self.request_switch(wallet, chain).await?;
        self.wait_for_chain(wallet, &mut events, chain).await?;

        tracing::info!(chain_id = chain.chain_id, added, "Wallet network switched");
        Ok(SyncOutcome::Switched { added })
    }

    async fn request_switch(
        &self,
        wallet: &dyn WalletProvider,
        chain: &ChainConfig,
    ) -> Result<bool, AppError> {
        let context = format!("Failed to switch to {}", chain.name);

        match wallet.switch_chain(chain.chain_id).await {
            Ok(()) => Ok(false),
            Err(e) if e.is_unrecognized_chain() => {
                tracing::info!(chain_id = chain.chain_id, "Chain unknown to wallet, adding it");
                wallet
                    .add_chain(&chain.add_chain_params())
                    .await
                    .map_err(|e| map_wallet_error(&e, &format!("Failed to add {}", chain.name)))?;
                // 只重试一次
                wallet
                    .switch_chain(chain.chain_id)
                    .await
                    .map_err(|e| map_wallet_error(&e, &context))?;
                Ok(true)
            }
            Err(e) => Err(map_wallet_error(&e, &context)),
        }
    }

    async fn wait_for_chain(
        &self,
        wallet: &dyn WalletProvider,
        events: &mut broadcast::Receiver<WalletEvent>,
        chain: &ChainConfig,
    ) -> Result<(), AppError> {
        let target = chain.chain_id;

        let confirmed = async {
            let mut events_open = true;
            loop {
                match wallet.chain_id().await {
                    Ok(id) if id == target => return,
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "Chain id poll failed"),
                }

                if !events_open {
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }

                tokio::select! {
                    event = events.recv() => match event {
                        Ok(WalletEvent::ChainChanged(id)) if id == target => return,
                        Ok(_) | Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => events_open = false,
                    },
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        };

        tokio::time::timeout(self.switch_timeout, confirmed)
            .await
            .map_err(|_| {
                tracing::warn!(
                    chain_id = target,
                    timeout_ms = self.switch_timeout.as_millis() as u64,
                    "Wallet did not confirm network switch"
                );
                AppError::switch_timeout(&chain.name, target)
            })
    }
}
