use std::sync::Arc;

use crate::{
    config::Config,
    domain::chain_config::ChainRegistry,
    infrastructure::wallet_rpc::RpcWalletProvider,
    service::SwapConsole,
    wallet::WalletProvider,
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ChainRegistry>,
    pub console: Arc<SwapConsole>,
}

impl AppState {
    /// 按配置创建应用状态；配置了钱包端点时连接钱包并启动事件轮询
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let wallet: Option<Arc<dyn WalletProvider>> = match &config.wallet.rpc_url {
            Some(url) => {
                let provider = Arc::new(RpcWalletProvider::connect(
                    url,
                    config.wallet.poll_interval(),
                )?);
                provider.spawn_watcher();
                tracing::info!(url = %url, "Wallet provider configured");
                Some(provider)
            }
            None => {
                tracing::warn!("No wallet endpoint configured, wallet actions will be rejected");
                None
            }
        };

        Ok(Self::with_wallet(config, wallet))
    }

    /// 注入任意钱包实现（测试使用）
    pub fn with_wallet(config: Arc<Config>, wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        let registry = Arc::new(ChainRegistry::new(
            &config.contracts,
            config.server.development,
        ));
        if let Err(errors) = registry.validate_configs() {
            for error in errors {
                tracing::warn!(error = %error, "Chain registry validation");
            }
        }

        let console = Arc::new(SwapConsole::new(&config, registry.clone(), wallet));
        console.spawn_event_listener();

        Self {
            config,
            registry,
            console,
        }
    }
}
