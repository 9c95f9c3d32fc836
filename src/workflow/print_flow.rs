//! 打印流程 - 流程层
//!
//! 状态机：
//! ```text
//! idle → opening → awaiting-typeset → printing → closed
//!   └──→ blocked（打不开打印上下文）
//! ```
//! 排版信号超时或出错都照常打印；打开失败时直接中止，不重试。

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::services::printer::{await_typeset, PrintContext, PrintTarget, TypesetOutcome};
use crate::workflow::export_ctx::ExportCtx;

/// 打印状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintState {
    Idle,
    Opening,
    AwaitingTypeset,
    Printing,
    Closed,
    Blocked,
}

impl fmt::Display for PrintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrintState::Idle => "idle",
            PrintState::Opening => "opening",
            PrintState::AwaitingTypeset => "awaiting-typeset",
            PrintState::Printing => "printing",
            PrintState::Closed => "closed",
            PrintState::Blocked => "blocked",
        };
        f.write_str(name)
    }
}

/// 一次打印的结果
#[derive(Debug, Clone)]
pub struct PrintReport {
    /// 经过的状态（含起点 idle）
    pub states: Vec<PrintState>,
    pub typeset: TypesetOutcome,
    pub pdf: Vec<u8>,
}

/// 打印中止：带着已经经过的状态返回
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PrintAborted {
    pub states: Vec<PrintState>,
    pub error: anyhow::Error,
}

/// 打印流程
///
/// - 只负责时序：打开 → 写入 → 等排版 → 打印 → 关闭
/// - 不持有任何资源，打印上下文由 `PrintTarget` 提供
pub struct PrintFlow {
    typeset_timeout: Duration,
    print_settle_delay: Duration,
}

impl PrintFlow {
    pub fn new(config: &Config) -> Self {
        Self::with_timings(config.typeset_timeout, config.print_settle_delay)
    }

    pub fn with_timings(typeset_timeout: Duration, print_settle_delay: Duration) -> Self {
        Self {
            typeset_timeout,
            print_settle_delay,
        }
    }

    /// 打印一份 HTML 快照
    ///
    /// 打开失败时状态为 `[idle, blocked]`，错误为目标给出的错误（`ExportError::BlockedPopup`）。
    /// 上下文一旦打开，无论打印成功与否都会关闭。
    pub async fn run<T: PrintTarget>(
        &self,
        target: &T,
        html: &str,
        ctx: &ExportCtx,
    ) -> Result<PrintReport, PrintAborted> {
        let mut states = vec![PrintState::Idle];

        self.transition(&mut states, PrintState::Opening, ctx);
        let context = match target.open().await {
            Ok(context) => context,
            Err(e) => {
                // blocked 直接从 idle 进入
                states.pop();
                self.transition(&mut states, PrintState::Blocked, ctx);
                warn!("{} ❌ 打印窗口被拦截: {}", ctx, e);
                return Err(PrintAborted { states, error: e });
            }
        };

        let printed = self.print_in(&context, html, &mut states, ctx).await;

        let closed = context.close().await;
        self.transition(&mut states, PrintState::Closed, ctx);
        if let Err(e) = closed {
            warn!("{} 关闭打印窗口失败: {}", ctx, e);
        }

        let (typeset, pdf) = match printed {
            Ok(printed) => printed,
            Err(error) => return Err(PrintAborted { states, error }),
        };
        info!("{} 🖨️ 打印完成 ({} 字节)", ctx, pdf.len());
        Ok(PrintReport {
            states,
            typeset,
            pdf,
        })
    }

    async fn print_in<C: PrintContext>(
        &self,
        context: &C,
        html: &str,
        states: &mut Vec<PrintState>,
        ctx: &ExportCtx,
    ) -> Result<(TypesetOutcome, Vec<u8>)> {
        context.write(html).await?;

        self.transition(states, PrintState::AwaitingTypeset, ctx);
        let typeset = await_typeset(context.typeset_ready(), self.typeset_timeout).await;

        if !self.print_settle_delay.is_zero() {
            sleep(self.print_settle_delay).await;
        }

        self.transition(states, PrintState::Printing, ctx);
        let pdf = context.print().await?;
        Ok((typeset, pdf))
    }

    fn transition(&self, states: &mut Vec<PrintState>, next: PrintState, ctx: &ExportCtx) {
        if let Some(current) = states.last() {
            debug!("{} 打印状态 {} → {}", ctx, current, next);
        }
        states.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct FakeTarget {
        blocked: bool,
        typeset_hangs: bool,
        print_fails: bool,
        closed: Arc<AtomicBool>,
    }

    impl FakeTarget {
        fn new() -> Self {
            Self {
                blocked: false,
                typeset_hangs: false,
                print_fails: false,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    struct FakeContext {
        typeset_hangs: bool,
        print_fails: bool,
        written: std::sync::Mutex<String>,
        closed: Arc<AtomicBool>,
    }

    impl PrintTarget for FakeTarget {
        type Context = FakeContext;

        async fn open(&self) -> Result<Self::Context> {
            if self.blocked {
                return Err(ExportError::BlockedPopup {
                    reason: "popup blocked".into(),
                }
                .into());
            }
            Ok(FakeContext {
                typeset_hangs: self.typeset_hangs,
                print_fails: self.print_fails,
                written: std::sync::Mutex::new(String::new()),
                closed: self.closed.clone(),
            })
        }
    }

    impl PrintContext for FakeContext {
        async fn write(&self, html: &str) -> Result<()> {
            self.written.lock().unwrap().push_str(html);
            Ok(())
        }

        async fn typeset_ready(&self) -> Result<()> {
            if self.typeset_hangs {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn print(&self) -> Result<Vec<u8>> {
            if self.print_fails {
                return Err(ExportError::PrintFailed {
                    reason: "printer offline".into(),
                }
                .into());
            }
            Ok(self.written.lock().unwrap().as_bytes().to_vec())
        }

        async fn close(self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn ctx() -> ExportCtx {
        ExportCtx::new("doc_1".into(), "Algebra".into(), 1)
    }

    fn flow() -> PrintFlow {
        PrintFlow::with_timings(Duration::from_millis(30), Duration::ZERO)
    }

    #[tokio::test]
    async fn walks_through_every_state() {
        let target = FakeTarget::new();
        let report = flow().run(&target, "<html>x</html>", &ctx()).await.unwrap();

        assert_eq!(
            report.states,
            vec![
                PrintState::Idle,
                PrintState::Opening,
                PrintState::AwaitingTypeset,
                PrintState::Printing,
                PrintState::Closed,
            ]
        );
        assert_eq!(report.typeset, TypesetOutcome::Ready);
        assert_eq!(report.pdf, b"<html>x</html>".to_vec());
        assert!(target.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn prints_anyway_when_typeset_never_finishes() {
        let mut target = FakeTarget::new();
        target.typeset_hangs = true;
        let report = flow().run(&target, "<html></html>", &ctx()).await.unwrap();
        assert_eq!(report.typeset, TypesetOutcome::TimedOut);
        assert_eq!(report.states.last(), Some(&PrintState::Closed));
    }

    #[tokio::test]
    async fn blocked_popup_aborts_without_printing() {
        let mut target = FakeTarget::new();
        target.blocked = true;
        let aborted = flow().run(&target, "<html></html>", &ctx()).await.unwrap_err();
        assert_eq!(aborted.states, vec![PrintState::Idle, PrintState::Blocked]);
        assert!(matches!(
            aborted.error.downcast_ref::<ExportError>(),
            Some(ExportError::BlockedPopup { .. })
        ));
        assert!(!target.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn context_is_closed_even_when_print_fails() {
        let mut target = FakeTarget::new();
        target.print_fails = true;
        let aborted = flow().run(&target, "<html></html>", &ctx()).await.unwrap_err();
        assert!(aborted.to_string().contains("printer offline"));
        assert_eq!(
            aborted.states,
            vec![
                PrintState::Idle,
                PrintState::Opening,
                PrintState::AwaitingTypeset,
                PrintState::Printing,
                PrintState::Closed,
            ]
        );
        assert!(target.closed.load(Ordering::SeqCst));
    }
}
