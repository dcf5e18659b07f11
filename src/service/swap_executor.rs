//! 兑换执行
//!
//! 先做本地校验（连接、金额、余额、合约配置、运行模式），通过后：
//! 读取 allowance，不足时 approve(bridge, MAX) 并等待上链，
//! 再调用 bridge.swap(token, amount, 目标链 ID) 并等待上链。
//! 同一时间只允许一笔兑换在途。

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use chrono::Utc;
use ethers::types::{Address, U256};

use crate::{
    contracts::{ContractTransport, Erc20Contract, SwapBridgeContract},
    domain::{
        chain_config::{ChainConfig, ChainKey, TokenSymbol},
        session::Session,
        swap::{BalanceView, OperatingMode, SwapForm, SwapResult, SwapStage},
    },
    error::AppError,
    error_map::{map_read_error, map_transaction_error},
    utils::amount::parse_amount,
};

/// 校验所需的当前状态
pub struct SwapInputs<'a> {
    pub session: Option<&'a Session>,
    pub form: &'a SwapForm,
    pub mode: OperatingMode,
    pub from: &'a ChainConfig,
    pub to: &'a ChainConfig,
    pub balance: &'a BalanceView,
}

/// 通过校验、可以直接执行的兑换
pub struct SwapPlan {
    signer: Arc<dyn ContractTransport>,
    owner: Address,
    token_address: Address,
    bridge_address: Address,
    amount_raw: U256,
    amount: String,
    token: TokenSymbol,
    from: ChainConfig,
    to_chain: ChainKey,
    destination_chain_id: u64,
}

impl SwapPlan {
    pub fn amount_raw(&self) -> U256 {
        self.amount_raw
    }

    pub fn destination_chain_id(&self) -> u64 {
        self.destination_chain_id
    }
}

#[derive(Default)]
pub struct SwapExecutor {
    in_flight: AtomicBool,
    stage: Mutex<SwapStage>,
}

/// 在途标记，离开作用域时复位
struct InFlight<'a> {
    executor: &'a SwapExecutor,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.executor.set_stage(SwapStage::Idle);
        self.executor.in_flight.store(false, Ordering::Release);
    }
}

impl SwapExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> SwapStage {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_stage(&self, stage: SwapStage) {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner()) = stage;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 本地校验，不发起任何链上请求
    pub fn validate(&self, inputs: SwapInputs<'_>) -> Result<SwapPlan, AppError> {
        let session = inputs.session.ok_or_else(AppError::not_connected)?;
        let form = inputs.form;

        let decimals = inputs.balance.decimals;
        let amount_raw = parse_amount(&form.amount, decimals).map_err(|e| {
            tracing::debug!(amount = %form.amount, error = %e, "Rejected swap amount");
            AppError::invalid_amount()
        })?;

        let available = inputs
            .balance
            .raw_for(form.from_chain, form.token)
            .unwrap_or_default();
        if amount_raw > available {
            return Err(AppError::insufficient_balance());
        }

        let (token_address, bridge_address) = match inputs.mode {
            OperatingMode::Local => match (
                inputs.from.token_address(form.token),
                inputs.from.swap_bridge_address,
            ) {
                (Some(token), Some(bridge)) => (token, bridge),
                _ => return Err(AppError::contracts_not_configured()),
            },
            OperatingMode::Demo => return Err(AppError::demo_mode()),
        };

        Ok(SwapPlan {
            signer: session.signer(),
            owner: session.address,
            token_address,
            bridge_address,
            amount_raw,
            amount: form.amount.trim().to_string(),
            token: form.token,
            from: inputs.from.clone(),
            to_chain: inputs.to.key,
            destination_chain_id: inputs.to.chain_id,
        })
    }

    /// 抢占在途标记；已有兑换在途时返回 SwapInProgress
    fn begin(&self) -> Result<InFlight<'_>, AppError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::swap_in_progress())?;
        Ok(InFlight { executor: self })
    }

    pub async fn execute(&self, plan: SwapPlan) -> Result<SwapResult, AppError> {
        let _guard = self.begin()?;
        let chain = &plan.from;

        let actual_chain_id = plan
            .signer
            .chain_id()
            .await
            .map_err(|e| map_read_error(&e, chain))?;
        if actual_chain_id != chain.chain_id {
            return Err(AppError::network_mismatch(&chain.name, chain.chain_id));
        }

        let token = Erc20Contract::new(plan.token_address, plan.signer.clone());
        let bridge = SwapBridgeContract::new(plan.bridge_address, plan.signer.clone());

        self.set_stage(SwapStage::CheckingAllowance);
        let allowance = token
            .allowance(plan.owner, plan.bridge_address)
            .await
            .map_err(|e| map_transaction_error(&e))?;

        let approval_tx_hash = if allowance < plan.amount_raw {
            self.set_stage(SwapStage::Approving);
            tracing::info!(
                token = %plan.token,
                spender = ?plan.bridge_address,
                "Allowance insufficient, approving bridge"
            );
            let approval = token
                .approve(plan.bridge_address, U256::MAX)
                .await
                .map_err(|e| map_transaction_error(&e))?;
            Some(approval.tx_hash)
        } else {
            None
        };

        self.set_stage(SwapStage::Swapping);
        let outcome = bridge
            .swap(plan.token_address, plan.amount_raw, plan.destination_chain_id)
            .await
            .map_err(|e| map_transaction_error(&e))?;

        tracing::info!(
            tx_hash = ?outcome.tx_hash,
            amount = %plan.amount,
            token = %plan.token,
            destination_chain_id = plan.destination_chain_id,
            "Swap confirmed"
        );

        Ok(SwapResult {
            tx_hash: outcome.tx_hash,
            approval_tx_hash,
            from_chain: chain.key,
            to_chain: plan.to_chain,
            destination_chain_id: plan.destination_chain_id,
            token: plan.token,
            amount: plan.amount,
            block_number: outcome.block_number,
            explorer_url: chain.tx_url(&format!("{:?}", outcome.tx_hash)),
            confirmed_at: Utc::now(),
        })
    }
}
