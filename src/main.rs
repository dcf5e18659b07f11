//! ArcFX 主入口

use std::sync::Arc;

use anyhow::Result;
use arcfx::{api, app_state::AppState, config::Config, infrastructure::logging};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载 .env
    dotenvy::dotenv().ok();

    // 2. 配置：CONFIG_PATH 指向的 TOML 优先，否则读环境变量
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Arc::new(Config::from_env_and_file(config_path.as_deref())?);

    // 3. 日志（guard 需存活到进程结束）
    let _log_guard = logging::init_logging(&config.logging)?;

    tracing::info!(
        development = config.server.development,
        contracts_configured = config.contracts.is_configured(),
        "Starting ArcFX"
    );

    // 4. 应用状态（钱包连接 + 兑换控制台）
    let state = Arc::new(AppState::new(config.clone())?);
    for chain in state.registry.list_all() {
        tracing::info!(chain = %chain.key, chain_id = chain.chain_id, "Chain available");
    }

    // 5. 启动 HTTP 服务
    let app = api::routes(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!("Server listening on http://{}", config.server.bind_addr);
    tracing::info!("OpenAPI: http://{}/api/openapi.json", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
