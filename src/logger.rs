//! 日志初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化全局日志，`RUST_LOG` 优先；否则按 `VERBOSE_LOGGING` 选择 debug / info
pub fn init() {
    let verbose = std::env::var("VERBOSE_LOGGING")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);
    let default_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), default_level)));

    // 测试里可能被多次调用，重复初始化直接忽略
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
