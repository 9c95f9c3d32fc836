//! 文档导出流程 - 流程层
//!
//! 一份文档的完整导出：
//! 1. 组装 HTML 快照
//! 2. 测量分页，写出带分页标记的预览
//! 3. 保存 `<slug>.html`
//! 4. （可选）打印为 `<slug>.pdf`
//!
//! 测量和打印失败只产生提示，不影响已保存的 HTML。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::i18n::Translator;
use crate::models::{AppSettings, Document, ExportOptions};
use crate::render::assemble_document;
use crate::services::download::{save_artifact, DownloadArtifact};
use crate::services::measurer::HeightMeasurer;
use crate::services::pagination::{render_preview, Pagination, PaginationEstimator, PreviewTracker};
use crate::services::printer::{PrintTarget, TypesetOutcome};
use crate::workflow::export_ctx::ExportCtx;
use crate::workflow::notice::Notice;
use crate::workflow::print_flow::PrintFlow;

/// 一份文档的导出结果
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub html_path: PathBuf,
    pub preview_path: Option<PathBuf>,
    pub pagination: Option<Pagination>,
    pub pdf_path: Option<PathBuf>,
    pub typeset: Option<TypesetOutcome>,
    pub notices: Vec<Notice>,
}

impl ExportReport {
    /// 没有任何错误提示
    pub fn succeeded(&self) -> bool {
        !self.notices.iter().any(Notice::is_error)
    }
}

/// 导出流程
///
/// - 持有设置和导出选项的快照
/// - 不持有浏览器资源，测量和打印能力由调用方传入
pub struct ExportFlow {
    settings: AppSettings,
    options: ExportOptions,
    output_dir: PathBuf,
    print_enabled: bool,
    print_flow: PrintFlow,
}

impl ExportFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.settings.clone(),
            options: config.export_options,
            output_dir: PathBuf::from(&config.output_dir),
            print_enabled: config.print_enabled,
            print_flow: PrintFlow::new(config),
        }
    }

    pub fn translator(&self) -> Translator {
        self.settings.translator()
    }

    /// 组装 HTML 快照；打印和下载共享同一份不可变字符串
    pub fn render(&self, doc: &Document) -> Arc<str> {
        Arc::from(assemble_document(doc, &self.settings, &self.options))
    }

    /// 测量分页并提交给预览状态
    ///
    /// 测量期间有更新的测量开始时，本次结果过期，返回 `None`。
    pub async fn preview<M: HeightMeasurer>(
        &self,
        estimator: &PaginationEstimator<M>,
        tracker: &PreviewTracker,
        html: &str,
    ) -> Result<Option<Pagination>> {
        let ticket = tracker.begin();
        let pagination = estimator.estimate(html).await?;
        if tracker.commit(ticket, pagination.clone()) {
            Ok(Some(pagination))
        } else {
            Ok(None)
        }
    }

    /// 执行一份文档的导出
    ///
    /// 只有 HTML 保存失败会返回错误，其他失败记录为提示。
    pub async fn run<M, T>(
        &self,
        doc: &Document,
        estimator: &PaginationEstimator<M>,
        tracker: &PreviewTracker,
        print_target: Option<&T>,
        ctx: &ExportCtx,
    ) -> Result<ExportReport>
    where
        M: HeightMeasurer,
        T: PrintTarget,
    {
        let translator = self.translator();
        let mut report = ExportReport::default();

        // ========== 1. 组装 ==========
        let html = self.render(doc);
        info!("{} 📄 HTML 已生成 ({} 字节)", ctx, html.len());

        // ========== 2. 分页预览 ==========
        match self.preview(estimator, tracker, &html).await {
            Ok(Some(pagination)) => {
                info!(
                    "{} 📏 预计 {} 页 (高度 {:.0}px)",
                    ctx, pagination.page_count, pagination.rendered_height
                );
                let preview_html = render_preview(&html, &pagination, &translator);
                let artifact = DownloadArtifact::preview(&doc.title, &preview_html);
                match save_artifact(&self.output_dir, &artifact).await {
                    Ok(path) => report.preview_path = Some(path),
                    Err(e) => warn!("{} ⚠️ 预览文件保存失败: {}", ctx, e),
                }
                report.pagination = Some(pagination);
            }
            Ok(None) => {
                debug!("{} 测量结果已过期，跳过预览", ctx);
            }
            Err(e) => {
                warn!("{} ⚠️ 分页测量失败，跳过预览: {}", ctx, e);
                report.notices.push(Notice::info(AppError::notice_text(&e, &translator)));
            }
        }

        // ========== 3. 下载 ==========
        let artifact = DownloadArtifact::html(&doc.title, &html);
        report.html_path = save_artifact(&self.output_dir, &artifact)
            .await
            .with_context(|| format!("{} 保存 HTML 失败", ctx))?;
        info!("{} 💾 已保存 {}", ctx, report.html_path.display());

        // ========== 4. 打印 ==========
        if let (true, Some(target)) = (self.print_enabled, print_target) {
            match self.print_flow.run(target, &html, ctx).await {
                Ok(printed) => {
                    let artifact = DownloadArtifact::pdf(&doc.title, printed.pdf);
                    match save_artifact(&self.output_dir, &artifact).await {
                        Ok(path) => report.pdf_path = Some(path),
                        Err(e) => {
                            report
                                .notices
                                .push(Notice::error(AppError::notice_text(&e, &translator)));
                        }
                    }
                    report.typeset = Some(printed.typeset);
                }
                Err(aborted) => {
                    debug!("{} 打印中止于 {:?}", ctx, aborted.states);
                    report
                        .notices
                        .push(Notice::error(AppError::notice_text(&aborted.error, &translator)));
                }
            }
        }

        if report.succeeded() {
            // 只报告本次测量的页数
            let message = match &report.pagination {
                Some(pagination) => {
                    let pages = pagination.page_count.to_string();
                    translator.t_with(
                        "toasts.exportSuccess",
                        &[("title", doc.title.as_str()), ("pages", pages.as_str())],
                    )
                }
                None => translator.t_with("toasts.exportSuccessNoPages", &[("title", doc.title.as_str())]),
            };
            report.notices.push(Notice::success(message));
        }

        Ok(report)
    }
}
