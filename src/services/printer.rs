//! 打印能力 - 业务能力层
//!
//! 打印需要一个临时的渲染上下文（相当于新开的打印窗口）。
//! `PrintTarget` 负责打开上下文，`PrintContext` 负责写入、等待排版、打印和关闭。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::Browser;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ExportError;
use crate::infrastructure::JsExecutor;

/// 等待 MathJax 启动完成的脚本
///
/// `window.MathJax` 里一开始只有配置，脚本加载后才会出现 `startup.promise`，所以先轮询。
const TYPESET_READY_JS: &str = r#"new Promise((resolve, reject) => {
  const check = () => {
    const mj = window.MathJax;
    if (mj && mj.startup && mj.startup.promise) {
      mj.startup.promise.then(() => resolve(true), (e) => reject(String(e)));
    } else {
      setTimeout(check, 50);
    }
  };
  check();
})"#;

/// 等待排版的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypesetOutcome {
    /// 收到了完成信号
    Ready,
    /// 超时，照常打印
    TimedOut,
    /// 信号本身出错，照常打印
    Failed(String),
}

/// 在限定时间内等待排版完成信号，任何情况下都不会无限挂起
pub async fn await_typeset<F>(signal: F, limit: Duration) -> TypesetOutcome
where
    F: Future<Output = Result<()>>,
{
    match timeout(limit, signal).await {
        Ok(Ok(())) => TypesetOutcome::Ready,
        Ok(Err(e)) => {
            warn!("⚠️ 排版信号出错，继续打印: {}", e);
            TypesetOutcome::Failed(e.to_string())
        }
        Err(_) => {
            warn!("⚠️ {}ms 内未收到排版完成信号，继续打印", limit.as_millis());
            TypesetOutcome::TimedOut
        }
    }
}

/// 可以打开打印上下文的目标
#[allow(async_fn_in_trait)]
pub trait PrintTarget {
    type Context: PrintContext;

    /// 打开新的上下文；失败时返回 `ExportError::BlockedPopup`
    async fn open(&self) -> Result<Self::Context>;
}

/// 临时打印上下文
#[allow(async_fn_in_trait)]
pub trait PrintContext {
    async fn write(&self, html: &str) -> Result<()>;

    /// 排版引擎的完成信号
    async fn typeset_ready(&self) -> Result<()>;

    /// 调用打印，返回打印产物
    async fn print(&self) -> Result<Vec<u8>>;

    async fn close(self) -> Result<()>;
}

/// 无头浏览器打印目标：每次打印开一个新页面
#[derive(Clone)]
pub struct BrowserPrintTarget {
    browser: Arc<Browser>,
}

impl BrowserPrintTarget {
    pub fn new(browser: Arc<Browser>) -> Self {
        Self { browser }
    }
}

impl PrintTarget for BrowserPrintTarget {
    type Context = BrowserPrintContext;

    async fn open(&self) -> Result<Self::Context> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ExportError::BlockedPopup {
                reason: e.to_string(),
            })?;
        debug!("打印页面已打开");
        Ok(BrowserPrintContext {
            executor: JsExecutor::new(page),
        })
    }
}

/// 浏览器中的打印页面
pub struct BrowserPrintContext {
    executor: JsExecutor,
}

impl PrintContext for BrowserPrintContext {
    async fn write(&self, html: &str) -> Result<()> {
        self.executor.set_content(html).await
    }

    async fn typeset_ready(&self) -> Result<()> {
        self.executor.eval(TYPESET_READY_JS).await?;
        Ok(())
    }

    async fn print(&self) -> Result<Vec<u8>> {
        self.executor.print_pdf().await.map_err(|e| {
            ExportError::PrintFailed {
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn close(self) -> Result<()> {
        self.executor.into_page().close().await?;
        debug!("打印页面已关闭");
        Ok(())
    }
}
