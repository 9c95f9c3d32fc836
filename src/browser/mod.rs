//! 浏览器接入
//!
//! 配置了调试端口时连接已有浏览器，否则自行启动无头浏览器。

pub mod connection;
pub mod headless;

use anyhow::Result;
use chromiumoxide::Browser;

use crate::config::Config;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// 按配置取得浏览器
pub async fn acquire_browser(config: &Config) -> Result<Browser> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_headless_browser(config.chrome_executable.as_deref()).await,
    }
}
