pub mod evm_transport;
pub mod logging;
pub mod wallet_rpc;

pub use evm_transport::EthersTransport;
pub use wallet_rpc::RpcWalletProvider;
