//! 单个文档处理器 - 编排层
//!
//! 为一份文档准备专用的测量页面，交给 `ExportFlow` 执行导出，
//! 结束后关闭测量页面并输出提示。

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::JsExecutor;
use crate::models::Document;
use crate::services::{BrowserMeasurer, BrowserPrintTarget, PaginationEstimator, PreviewTracker};
use crate::utils::append_notice;
use crate::workflow::{ExportCtx, ExportFlow, ExportReport, NoticeLevel};

/// 导出单个文档
///
/// # 参数
/// - `browser`: 浏览器（用于开测量页面）
/// - `flow`: 导出流程（所有文档共享）
/// - `print_target`: 打印目标，关闭打印时为 None
/// - `doc`: 文档快照
/// - `document_index`: 文档序号（用于日志）
///
/// # 返回
/// 返回导出结果，提示中包含成功或失败信息
pub async fn process_document(
    browser: &Browser,
    flow: &ExportFlow,
    print_target: Option<&BrowserPrintTarget>,
    doc: &Document,
    document_index: usize,
    config: &Config,
) -> Result<ExportReport> {
    let ctx = ExportCtx::new(doc.id.clone(), doc.title.clone(), document_index);
    log_document_start(&ctx, doc.exercises.len());

    // 每个文档使用独立的测量页面，互不干扰
    let page = browser
        .new_page("about:blank")
        .await
        .with_context(|| format!("{} 无法创建测量页面", ctx))?;
    let measurer = BrowserMeasurer::new(JsExecutor::new(page)).await?;
    let estimator =
        PaginationEstimator::new(measurer, config.page_height_px, config.measure_settle_delay);
    let tracker = PreviewTracker::new();

    let result = flow
        .run(doc, &estimator, &tracker, print_target, &ctx)
        .await;

    if let Err(e) = estimator
        .into_measurer()
        .into_executor()
        .into_page()
        .close()
        .await
    {
        warn!("{} 关闭测量页面失败: {}", ctx, e);
    }

    let report = result?;
    for notice in &report.notices {
        match notice.level {
            NoticeLevel::Error => error!("{} ❌ {}", ctx, notice.message),
            NoticeLevel::Info => warn!("{} {}", ctx, notice.message),
            NoticeLevel::Success => info!("{} ✅ {}", ctx, notice.message),
        }
        if let Err(e) = append_notice(&config.output_log_file, &doc.title, notice) {
            warn!("写入日志文件失败: {}", e);
        }
    }

    Ok(report)
}

fn log_document_start(ctx: &ExportCtx, exercise_count: usize) {
    info!("\n{}", "─".repeat(60));
    info!("{} 开始导出，共 {} 道练习", ctx, exercise_count);
    info!("{}", "─".repeat(60));
}
