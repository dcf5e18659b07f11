//! 基于 ethers `Provider<Http>` 的签名句柄
//!
//! 只读调用走 `eth_call`，写交易走 `eth_sendTransaction`（由钱包签名），
//! 然后等待收据。

use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider, ProviderError, RpcError},
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest},
};

use crate::contracts::{decode_revert_reason, ContractCallError, ContractTransport, TxOutcome};

#[derive(Clone)]
pub struct EthersTransport {
    provider: Provider<Http>,
    account: Address,
}

impl EthersTransport {
    pub fn new(provider: Provider<Http>, account: Address) -> Self {
        Self { provider, account }
    }

    fn request(&self, to: Address, data: Bytes) -> TypedTransaction {
        TransactionRequest::new()
            .from(self.account)
            .to(to)
            .data(data)
            .into()
    }
}

#[async_trait]
impl ContractTransport for EthersTransport {
    fn account(&self) -> Address {
        self.account
    }

    async fn chain_id(&self) -> Result<u64, ContractCallError> {
        let id = self
            .provider
            .get_chainid()
            .await
            .map_err(classify_provider_error)?;
        Ok(id.as_u64())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ContractCallError> {
        let tx = self.request(to, data);
        self.provider
            .call(&tx, None)
            .await
            .map_err(classify_provider_error)
    }

    async fn send(&self, to: Address, data: Bytes) -> Result<TxOutcome, ContractCallError> {
        let tx = self.request(to, data);
        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(classify_provider_error)?;
        let tx_hash = pending.tx_hash();
        tracing::info!(tx_hash = ?tx_hash, "Transaction submitted, waiting for receipt");

        let receipt = pending
            .await
            .map_err(classify_provider_error)?
            .ok_or_else(|| ContractCallError::Dropped(format!("{:?}", tx_hash)))?;

        if receipt.status.map(|s| s.as_u64()) == Some(0) {
            return Err(ContractCallError::Reverted { reason: None });
        }

        Ok(TxOutcome {
            tx_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }
}

/// ProviderError -> ContractCallError
pub fn classify_provider_error(err: ProviderError) -> ContractCallError {
    if let Some(resp) = err.as_error_response() {
        if let Some(data) = resp.as_revert_data() {
            return ContractCallError::Reverted {
                reason: decode_revert_reason(&data),
            };
        }
        if let Some(reason) = revert_reason_from_message(&resp.message) {
            return ContractCallError::Reverted { reason };
        }
        return ContractCallError::Rpc {
            code: resp.code,
            message: resp.message.clone(),
        };
    }

    if err.is_serde_error() {
        return ContractCallError::Decode(err.to_string());
    }

    ContractCallError::Network(err.to_string())
}

/// 节点只在 message 里给出 "execution reverted: xxx" 的情况
fn revert_reason_from_message(message: &str) -> Option<Option<String>> {
    let rest = message.strip_prefix("execution reverted")?;
    let reason = rest.trim_start_matches(':').trim();
    Some((!reason.is_empty()).then(|| reason.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_reason_from_message() {
        assert_eq!(
            revert_reason_from_message("execution reverted: Insufficient allowance"),
            Some(Some("Insufficient allowance".to_string()))
        );
        assert_eq!(revert_reason_from_message("execution reverted"), Some(None));
        assert_eq!(revert_reason_from_message("nonce too low"), None);
    }

    #[test]
    fn test_custom_errors_classify_as_network() {
        let err = classify_provider_error(ProviderError::CustomError("connection refused".into()));
        assert!(matches!(err, ContractCallError::Network(_)));
    }
}
