use std::sync::Arc;

use ethers::{
    abi::Token,
    types::{Address, U256},
};

use super::{decode_uint, encode_call, ContractCallError, ContractTransport, TxOutcome};

/// 10^77 是 uint256 能表示的最大 10 的幂
pub const MAX_TOKEN_DECIMALS: u8 = 77;

/// ERC-20 代币合约（balanceOf / decimals / allowance / approve / transfer）
#[derive(Clone)]
pub struct Erc20Contract {
    address: Address,
    transport: Arc<dyn ContractTransport>,
}

impl Erc20Contract {
    pub fn new(address: Address, transport: Arc<dyn ContractTransport>) -> Self {
        Self { address, transport }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, ContractCallError> {
        let data = encode_call("balanceOf(address)", &[Token::Address(owner)]);
        let raw = self.transport.call(self.address, data).await?;
        decode_uint(&raw)
    }

    pub async fn decimals(&self) -> Result<u8, ContractCallError> {
        let raw = self
            .transport
            .call(self.address, encode_call("decimals()", &[]))
            .await?;
        let value = decode_uint(&raw)?;
        if value > U256::from(MAX_TOKEN_DECIMALS) {
            return Err(ContractCallError::Decode(format!(
                "decimals out of range: {}",
                value
            )));
        }
        Ok(value.as_u32() as u8)
    }

    pub async fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ContractCallError> {
        let data = encode_call(
            "allowance(address,address)",
            &[Token::Address(owner), Token::Address(spender)],
        );
        let raw = self.transport.call(self.address, data).await?;
        decode_uint(&raw)
    }

    pub async fn approve(
        &self,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome, ContractCallError> {
        let data = encode_call(
            "approve(address,uint256)",
            &[Token::Address(spender), Token::Uint(amount)],
        );
        self.transport.send(self.address, data).await
    }

    pub async fn transfer(&self, to: Address, amount: U256) -> Result<TxOutcome, ContractCallError> {
        let data = encode_call(
            "transfer(address,uint256)",
            &[Token::Address(to), Token::Uint(amount)],
        );
        self.transport.send(self.address, data).await
    }
}
