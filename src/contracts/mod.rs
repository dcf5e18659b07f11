//! 合约调用抽象
//!
//! `ContractTransport` 是钱包签名句柄的抽象：只读调用走 `eth_call`，
//! 写入交易走钱包的 `eth_sendTransaction` 并等待上链。
//! `Erc20Contract` / `SwapBridgeContract` 在其之上做 ABI 编解码。

use async_trait::async_trait;
use ethers::{
    abi::{decode, encode, ParamType, Token},
    types::{Address, Bytes, H256, U256},
};
use serde::Serialize;

pub mod erc20;
pub mod swap_bridge;

pub use erc20::Erc20Contract;
pub use swap_bridge::SwapBridgeContract;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ContractCallError {
    /// 传输层 / 节点不可达
    #[error("network error: {0}")]
    Network(String),
    /// 合约回滚（reason 为解码出的 revert 字符串）
    #[error("execution reverted: {}", reason.as_deref().unwrap_or("unknown reason"))]
    Reverted { reason: Option<String> },
    /// 节点返回的 JSON-RPC 错误
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// 返回数据无法按 ABI 解码
    #[error("failed to decode contract response: {0}")]
    Decode(String),
    /// 交易被替换或丢弃，没有收据
    #[error("transaction dropped: {0}")]
    Dropped(String),
}

/// 已上链交易的摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
}

/// 绑定了账户和网络上下文的签名句柄
#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// 发送交易所用的账户
    fn account(&self) -> Address;

    /// 句柄实际所在的链（实时查询，不是获取句柄时的快照）
    async fn chain_id(&self) -> Result<u64, ContractCallError>;

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ContractCallError>;

    /// 提交交易并等待其被打包
    async fn send(&self, to: Address, data: Bytes) -> Result<TxOutcome, ContractCallError>;
}

pub(crate) fn selector(sig: &str) -> [u8; 4] {
    let hash = ethers::utils::keccak256(sig.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub(crate) fn encode_call(sig: &str, args: &[Token]) -> Bytes {
    let mut out = Vec::with_capacity(4 + 32 * args.len());
    out.extend_from_slice(&selector(sig));
    out.extend_from_slice(&encode(args));
    Bytes::from(out)
}

pub(crate) fn decode_uint(data: &Bytes) -> Result<U256, ContractCallError> {
    let tokens = decode(&[ParamType::Uint(256)], data.as_ref())
        .map_err(|e| ContractCallError::Decode(e.to_string()))?;
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| ContractCallError::Decode("expected uint256 word".to_string()))
}

/// 解码 `Error(string)` 形式的 revert 数据
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let error_selector = selector("Error(string)");
    if data.len() < 4 || data[..4] != error_selector {
        return None;
    }
    decode(&[ParamType::String], &data[4..])
        .ok()?
        .into_iter()
        .next()?
        .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
        assert_eq!(hex::encode(selector("approve(address,uint256)")), "095ea7b3");
        assert_eq!(hex::encode(selector("allowance(address,address)")), "dd62ed3e");
        assert_eq!(hex::encode(selector("decimals()")), "313ce567");
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
    }

    #[test]
    fn test_decode_uint_rejects_short_data() {
        let err = decode_uint(&Bytes::from(vec![0u8; 4])).unwrap_err();
        assert!(matches!(err, ContractCallError::Decode(_)));
    }

    #[test]
    fn test_decode_revert_reason() {
        let mut data = selector("Error(string)").to_vec();
        data.extend_from_slice(&encode(&[Token::String("Amount below minimum".into())]));
        assert_eq!(
            decode_revert_reason(&data).as_deref(),
            Some("Amount below minimum")
        );
        assert_eq!(decode_revert_reason(&[0x12, 0x34]), None);
    }
}
