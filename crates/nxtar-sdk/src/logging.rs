//! 日志初始化
//!
//! 安装 `tracing-subscriber` 的 fmt 订阅者，并把 `log` crate 的记录桥接到 `tracing`。

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;

/// 环境变量未设置或无法解析时使用的过滤指令
pub const FALLBACK_DIRECTIVE: &str = "info";

/// 构造过滤器：优先读取 `RUST_LOG`，否则使用 `default_directive`
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
}

/// 初始化全局日志
///
/// 全局订阅者已被设置时返回错误（例如重复调用）。
///
/// # Example
///
/// ```
/// nxtar_sdk::init_logger("nxtar_driver=debug").ok();
/// tracing::info!("ready");
/// log::info!("log 记录同样被转发");
/// ```
pub fn init_logger(default_directive: &str) -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 其他组件可能已经安装了 log 后端
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("log bridge not installed: {}", e);
    }
    Ok(())
}
