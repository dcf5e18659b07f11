//! 兑换控制台
//!
//! 持有表单和视图状态，把用户操作和钱包事件串成固定的流程：
//! 连接 -> 同步网络 -> 加载余额 -> 估算费用；兑换只在显式提交时执行。

use std::sync::Arc;

use ethers::types::{Address, U256};
use serde::Serialize;
use tokio::{
    sync::{broadcast::error::RecvError, RwLock},
    task::JoinHandle,
};

use crate::{
    config::{Config, ContractsConfig},
    contracts::SwapBridgeContract,
    domain::{
        chain_config::{ChainConfig, ChainKey, ChainRegistry},
        session::{short_address, Session},
        swap::{
            BalanceView, FeeEstimate, FormUpdate, OperatingMode, SwapForm, SwapResult, SwapStage,
        },
    },
    error::AppError,
    error_map::map_read_error,
    service::{
        balance_loader::BalanceLoader,
        fee_estimator::{FeeContext, FeeEstimator},
        network_sync::{NetworkSynchronizer, SyncOutcome},
        swap_executor::{SwapExecutor, SwapInputs},
        wallet_session::WalletSessionManager,
    },
    wallet::{WalletEvent, WalletProvider},
};

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub address: Address,
    pub short_address: String,
    pub chain_id: u64,
    pub generation: u64,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            address: session.address,
            short_address: short_address(&session.address),
            chain_id: session.chain_id,
            generation: session.generation,
        }
    }
}

/// 控制台状态快照
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleSnapshot {
    pub form: SwapForm,
    pub mode: OperatingMode,
    pub wallet_available: bool,
    pub session: Option<SessionView>,
    pub balance: BalanceView,
    pub fee: Option<FeeEstimate>,
    pub swap_stage: SwapStage,
    pub last_swap: Option<SwapResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeInfo {
    pub chain: ChainKey,
    pub address: Address,
    pub fee_bps: U256,
    pub min_swap_amount: U256,
}

#[derive(Debug, Default)]
struct ViewState {
    balance: BalanceView,
    fee: Option<FeeEstimate>,
    last_swap: Option<SwapResult>,
}

pub struct SwapConsole {
    registry: Arc<ChainRegistry>,
    contracts: ContractsConfig,
    sessions: WalletSessionManager,
    sync: NetworkSynchronizer,
    balances: BalanceLoader,
    fees: FeeEstimator,
    swaps: SwapExecutor,
    form: RwLock<SwapForm>,
    view: RwLock<ViewState>,
}

impl SwapConsole {
    pub fn new(
        config: &Config,
        registry: Arc<ChainRegistry>,
        wallet: Option<Arc<dyn WalletProvider>>,
    ) -> Self {
        Self {
            registry,
            contracts: config.contracts.clone(),
            sessions: WalletSessionManager::new(wallet),
            sync: NetworkSynchronizer::new(
                config.wallet.switch_timeout(),
                config.wallet.poll_interval(),
            ),
            balances: BalanceLoader::new(),
            fees: FeeEstimator::new(config.fees.base_fee, config.fees.bridge_fee_rate),
            swaps: SwapExecutor::new(),
            form: RwLock::new(SwapForm::default()),
            view: RwLock::new(ViewState::default()),
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &WalletSessionManager {
        &self.sessions
    }

    pub async fn form(&self) -> SwapForm {
        self.form.read().await.clone()
    }

    fn chain(&self, key: ChainKey) -> Result<&ChainConfig, AppError> {
        self.registry.get(key).ok_or_else(|| {
            AppError::chain_not_supported(format!("Chain {} is not available", key))
        })
    }

    pub fn mode_for(&self, from: &ChainConfig) -> OperatingMode {
        if from.chain_id == self.contracts.local_chain_id || self.contracts.is_configured() {
            OperatingMode::Local
        } else {
            OperatingMode::Demo
        }
    }

    pub async fn snapshot(&self) -> ConsoleSnapshot {
        let form = self.form().await;
        let mode = self
            .chain(form.from_chain)
            .map(|c| self.mode_for(c))
            .unwrap_or(OperatingMode::Demo);
        let session = self.sessions.session().await;
        let view = self.view.read().await;

        ConsoleSnapshot {
            form,
            mode,
            wallet_available: self.sessions.has_wallet(),
            session: session.as_ref().map(SessionView::from),
            balance: view.balance.clone(),
            fee: view.fee.clone(),
            swap_stage: self.swaps.stage(),
            last_swap: view.last_swap.clone(),
        }
    }

    /// 连接钱包，然后同步到源链并加载余额
    pub async fn connect(&self) -> Result<ConsoleSnapshot, AppError> {
        self.sessions.connect().await?;
        self.sync_source_chain().await;
        self.refresh_balance().await;
        self.estimate_fee().await;
        Ok(self.snapshot().await)
    }

    /// 让钱包切到当前源链；失败只记录日志，不中断调用方
    async fn sync_source_chain(&self) {
        if self.sessions.session().await.is_none() {
            return;
        }
        let from = self.form().await.from_chain;
        if let Err(e) = self.try_sync_chain(from).await {
            tracing::warn!(
                chain = %from,
                code = e.code.as_str(),
                error = %e,
                "Network sync failed"
            );
        }
    }

    async fn try_sync_chain(&self, key: ChainKey) -> Result<(), AppError> {
        let chain = self.chain(key)?;
        let wallet = self.sessions.wallet()?;
        match self.sync.ensure_chain(wallet.as_ref(), chain).await? {
            SyncOutcome::AlreadyOnChain => Ok(()),
            SyncOutcome::Switched { .. } => {
                self.sessions.reacquire(None).await?;
                Ok(())
            }
        }
    }

    pub async fn update_form(&self, update: FormUpdate) -> Result<ConsoleSnapshot, AppError> {
        for key in [update.from_chain, update.to_chain].into_iter().flatten() {
            self.chain(key)?;
        }

        let changes = {
            let mut form = self.form.write().await;
            update.apply(&mut form)
        };

        if changes.source {
            self.on_source_changed().await;
        } else if changes.amount {
            self.estimate_fee().await;
        }
        Ok(self.snapshot().await)
    }

    /// 交换源链和目标链
    pub async fn flip_chains(&self) -> Result<ConsoleSnapshot, AppError> {
        {
            let mut form = self.form.write().await;
            let form = &mut *form;
            std::mem::swap(&mut form.from_chain, &mut form.to_chain);
        }
        self.on_source_changed().await;
        Ok(self.snapshot().await)
    }

    async fn on_source_changed(&self) {
        self.sync_source_chain().await;
        self.refresh_balance().await;
        self.estimate_fee().await;
    }

    /// 重新加载余额；结果写入视图并返回
    pub async fn refresh_balance(&self) -> BalanceView {
        let form = self.form().await;
        let session = self.sessions.session().await;

        let decimals = self.view.read().await.balance.decimals;
        if session.is_some() {
            self.view.write().await.balance =
                BalanceView::loading(form.from_chain, form.token, decimals);
        }

        // 无会话时由加载器给出 "Wallet not connected"
        let view = match self.chain(form.from_chain) {
            Ok(chain) => match self.balances.load(session.as_ref(), chain, form.token).await {
                Ok(loaded) => BalanceView::loaded(
                    form.from_chain,
                    form.token,
                    loaded.raw,
                    loaded.decimals,
                    loaded.display,
                ),
                Err(e) => {
                    tracing::warn!(
                        chain = %form.from_chain,
                        token = %form.token,
                        error = %e,
                        "Balance load failed"
                    );
                    BalanceView::failed(form.from_chain, form.token, decimals, e.message)
                }
            },
            Err(e) => BalanceView::failed(form.from_chain, form.token, decimals, e.message),
        };

        self.view.write().await.balance = view.clone();
        view
    }

    /// 按当前表单重新估算费用
    pub async fn estimate_fee(&self) -> Option<FeeEstimate> {
        let form = self.form().await;
        let chain = self.chain(form.from_chain).ok()?.clone();
        let session = self.sessions.session().await;
        let decimals = self.view.read().await.balance.decimals;

        let fee = self
            .fees
            .estimate(
                &form.amount,
                FeeContext {
                    mode: self.mode_for(&chain),
                    signer: session.map(|s| s.signer()),
                    bridge: chain.swap_bridge_address,
                    token: form.token,
                    decimals,
                },
            )
            .await;

        self.view.write().await.fee = fee.clone();
        fee
    }

    /// 提交兑换
    pub async fn submit_swap(&self) -> Result<SwapResult, AppError> {
        if self.swaps.is_busy() {
            return Err(AppError::swap_in_progress());
        }

        let form = self.form().await;
        let from = self.chain(form.from_chain)?;
        let to = self.chain(form.to_chain)?;
        let session = self.sessions.session().await;
        let balance = self.view.read().await.balance.clone();

        let plan = self.swaps.validate(SwapInputs {
            session: session.as_ref(),
            form: &form,
            mode: self.mode_for(from),
            from,
            to,
            balance: &balance,
        })?;

        tracing::info!(
            from = %form.from_chain,
            to = %form.to_chain,
            token = %form.token,
            amount = %form.amount,
            "Submitting swap"
        );
        let result = self.swaps.execute(plan).await?;

        self.view.write().await.last_swap = Some(result.clone());
        self.refresh_balance().await;
        Ok(result)
    }

    /// 钱包通知：重新获取签名句柄并刷新余额
    pub async fn handle_wallet_event(&self, event: WalletEvent) {
        let address = match &event {
            WalletEvent::ChainChanged(_) => None,
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(address) => Some(*address),
                None => {
                    tracing::warn!("Wallet reported no accounts, keeping current session");
                    return;
                }
            },
        };

        match self.sessions.reacquire(address).await {
            Ok(Some(_)) => {
                self.refresh_balance().await;
                self.estimate_fee().await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(?event, error = %e, "Failed to rebind session after wallet event")
            }
        }
    }

    /// 订阅钱包通知并交给 `handle_wallet_event`
    pub fn spawn_event_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let wallet = self.sessions.wallet().ok()?;
        let mut events = wallet.subscribe();
        let console = Arc::clone(self);

        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => console.handle_wallet_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Wallet event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }

    /// 源链上桥合约的费率和最小兑换额
    pub async fn bridge_info(&self) -> Result<BridgeInfo, AppError> {
        let form = self.form().await;
        let chain = self.chain(form.from_chain)?;
        let address = chain
            .swap_bridge_address
            .ok_or_else(AppError::contracts_not_configured)?;
        let session = self
            .sessions
            .session()
            .await
            .ok_or_else(AppError::not_connected)?;

        let bridge = SwapBridgeContract::new(address, session.signer());
        let fee_bps = bridge.bridge_fee_bps();
        let min_swap_amount = bridge.min_swap_amount();
        let (fee_bps, min_swap_amount) = tokio::try_join!(fee_bps, min_swap_amount)
            .map_err(|e| map_read_error(&e, chain))?;

        Ok(BridgeInfo {
            chain: chain.key,
            address,
            fee_bps,
            min_swap_amount,
        })
    }
}
