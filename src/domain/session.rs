//! 钱包会话
//!
//! 会话对象显式持有签名句柄；网络切换或钱包事件之后通过 `rebind`
//! 整体替换，而不是就地改写句柄。

use std::{fmt, sync::Arc};

use ethers::types::Address;

use crate::contracts::ContractTransport;

#[derive(Clone)]
pub struct Session {
    pub address: Address,
    /// 获取句柄时钱包所在的链
    pub chain_id: u64,
    /// 每次重新获取句柄递增
    pub generation: u64,
    signer: Arc<dyn ContractTransport>,
}

impl Session {
    pub fn new(address: Address, chain_id: u64, signer: Arc<dyn ContractTransport>) -> Self {
        Self {
            address,
            chain_id,
            generation: 0,
            signer,
        }
    }

    pub fn signer(&self) -> Arc<dyn ContractTransport> {
        self.signer.clone()
    }

    /// 以新的句柄替换当前会话
    pub fn rebind(
        &self,
        address: Address,
        chain_id: u64,
        signer: Arc<dyn ContractTransport>,
    ) -> Session {
        Session {
            address,
            chain_id,
            generation: self.generation + 1,
            signer,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected(Session),
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Connected(session) => Some(session),
            SessionState::Disconnected => None,
        }
    }
}

/// 地址缩写：0x1234...abcd
pub fn short_address(address: &Address) -> String {
    let full = format!("{:?}", address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
