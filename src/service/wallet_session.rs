//! 钱包会话管理
//!
//! 负责连接钱包、在网络切换或账户变化后重新获取签名句柄。
//! 会话状态只在这里被写入。

use std::sync::Arc;

use ethers::types::Address;
use tokio::sync::RwLock;

use crate::{
    domain::session::{short_address, Session, SessionState},
    error::AppError,
    error_map::map_wallet_error,
    wallet::WalletProvider,
};

pub struct WalletSessionManager {
    wallet: Option<Arc<dyn WalletProvider>>,
    state: RwLock<SessionState>,
}

impl WalletSessionManager {
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            wallet,
            state: RwLock::new(SessionState::Disconnected),
        }
    }

    /// 钱包提供方；没有注入钱包时返回 NoProvider
    pub fn wallet(&self) -> Result<Arc<dyn WalletProvider>, AppError> {
        self.wallet.clone().ok_or_else(AppError::no_provider)
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session().cloned()
    }

    /// 请求账户授权并建立会话（已连接时等价于重新获取）
    pub async fn connect(&self) -> Result<Session, AppError> {
        let wallet = self.wallet()?;
        let accounts = wallet
            .request_accounts()
            .await
            .map_err(|e| map_wallet_error(&e, "Failed to connect wallet"))?;
        let address = *accounts.first().ok_or_else(AppError::no_accounts)?;

        let session = self.bind(wallet.as_ref(), address).await?;
        tracing::info!(
            address = %short_address(&session.address),
            chain_id = session.chain_id,
            "Wallet connected"
        );
        Ok(session)
    }

    /// 以当前钱包网络重新获取签名句柄
    ///
    /// `address` 为 None 时沿用当前账户；未连接时不做任何事。
    pub async fn reacquire(&self, address: Option<Address>) -> Result<Option<Session>, AppError> {
        let current = match self.session().await {
            Some(session) => session,
            None => return Ok(None),
        };
        let wallet = self.wallet()?;
        let address = address.unwrap_or(current.address);

        let session = self.bind(wallet.as_ref(), address).await?;
        tracing::info!(
            address = %short_address(&session.address),
            chain_id = session.chain_id,
            generation = session.generation,
            "Wallet session rebound"
        );
        Ok(Some(session))
    }

    async fn bind(&self, wallet: &dyn WalletProvider, address: Address) -> Result<Session, AppError> {
        let chain_id = wallet
            .chain_id()
            .await
            .map_err(|e| map_wallet_error(&e, "Failed to read wallet network"))?;
        let signer = wallet
            .signer(address)
            .await
            .map_err(|e| map_wallet_error(&e, "Failed to get signer"))?;

        let mut state = self.state.write().await;
        let session = match state.session() {
            Some(previous) => previous.rebind(address, chain_id, signer),
            None => Session::new(address, chain_id, signer),
        };
        *state = SessionState::Connected(session.clone());
        Ok(session)
    }
}
