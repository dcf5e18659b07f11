use std::sync::Arc;

use ethers::{
    abi::Token,
    types::{Address, U256},
};

use super::{decode_uint, encode_call, ContractCallError, ContractTransport, TxOutcome};

pub const SWAP_SIGNATURE: &str = "swap(address,uint256,uint256)";

/// SwapBridge 合约：接收代币存入并记录目标链
#[derive(Clone)]
pub struct SwapBridgeContract {
    address: Address,
    transport: Arc<dyn ContractTransport>,
}

impl SwapBridgeContract {
    pub fn new(address: Address, transport: Arc<dyn ContractTransport>) -> Self {
        Self { address, transport }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn bridge_fee_bps(&self) -> Result<U256, ContractCallError> {
        let raw = self
            .transport
            .call(self.address, encode_call("bridgeFeeBps()", &[]))
            .await?;
        decode_uint(&raw)
    }

    pub async fn min_swap_amount(&self) -> Result<U256, ContractCallError> {
        let raw = self
            .transport
            .call(self.address, encode_call("minSwapAmount()", &[]))
            .await?;
        decode_uint(&raw)
    }

    pub async fn swap(
        &self,
        token: Address,
        amount: U256,
        destination_chain_id: u64,
    ) -> Result<TxOutcome, ContractCallError> {
        let data = encode_call(
            SWAP_SIGNATURE,
            &[
                Token::Address(token),
                Token::Uint(amount),
                Token::Uint(U256::from(destination_chain_id)),
            ],
        );
        self.transport.send(self.address, data).await
    }
}
