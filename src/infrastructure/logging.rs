//! 日志初始化
//! 控制台输出 + 可选的按天滚动文件，json / text 两种格式

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_LOG_FILE: &str = "arcfx.log";

/// 初始化日志系统
///
/// 启用文件日志时返回后台写线程的 guard，调用方需持有到进程退出，
/// 否则缓冲中的日志会丢失。
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},arcfx={},tower_http={}",
            config.level, config.level, config.level
        ))
    });
    let json = config.format == "json";

    let stdout_layer = if json {
        fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .boxed()
    } else {
        fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true)
            .boxed()
    };

    if !config.enable_file_logging {
        Registry::default()
            .with(filter)
            .with(stdout_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;
        return Ok(None);
    }

    let (dir, file_name) = log_file_location(config.log_file_path.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {:?}", dir))?;

    let (writer, guard) = non_blocking(rolling::daily(&dir, file_name));
    let file_layer = if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(ChronoUtc::rfc_3339())
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false)
            .boxed()
    };

    Registry::default()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(Some(guard))
}

/// LOG_FILE_PATH 拆成 (目录, 文件名前缀)
fn log_file_location(path: Option<&str>) -> (PathBuf, String) {
    let Some(path) = path.map(Path::new) else {
        return (PathBuf::from(DEFAULT_LOG_DIR), DEFAULT_LOG_FILE.to_string());
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();

    (dir, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_location() {
        assert_eq!(
            log_file_location(None),
            (PathBuf::from("./logs"), "arcfx.log".to_string())
        );
        assert_eq!(
            log_file_location(Some("/var/log/arcfx/server.log")),
            (PathBuf::from("/var/log/arcfx"), "server.log".to_string())
        );
        assert_eq!(
            log_file_location(Some("server.log")),
            (PathBuf::from("./logs"), "server.log".to_string())
        );
    }
}
