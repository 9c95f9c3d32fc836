//! 批量导出处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量导出和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志抬头、启动或连接浏览器
//! 2. **加载文档**：从文档文件读取全部文档，可选合并导入文件
//! 3. **图片导入**：（可选）识别图片目录并追加练习
//! 4. **并发控制**：使用 Semaphore 限制同时导出的文档数
//! 5. **全局统计**：汇总所有文档的导出结果
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 Browser 的模块
//! - **向下委托**：委托 document_processor 处理单个文档
//! - **失败隔离**：单个文档失败不影响其他文档

use std::sync::Arc;

use anyhow::Result;
use chromiumoxide::Browser;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::AppError;
use crate::orchestrator::{document_processor, file_importer, image_importer};
use crate::services::BrowserPrintTarget;
use crate::store::DocumentStore;
use crate::utils::{init_log_file, log_documents_loaded, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    browser: Arc<Browser>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        log_startup(config.max_concurrent_exports, config.print_enabled);

        let browser = browser::acquire_browser(&config).await?;

        Ok(Self {
            config,
            browser: Arc::new(browser),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let translator = self.config.settings.translator();

        info!("\n📁 正在加载文档: {}", self.config.documents_file);
        let mut store = match file_importer::open_store(&self.config.documents_file, &translator).await {
            Ok(store) => store,
            Err(notice) => {
                error!("❌ {}", notice.message);
                warn!("⚠️ 文档文件无法使用，程序结束");
                return Ok(());
            }
        };

        if let Some(notice) = file_importer::import_file(&mut store, &self.config, &translator).await {
            if notice.is_error() {
                error!("❌ {}", notice.message);
            } else {
                info!("✅ {}", notice.message);
            }
        }

        if let Err(e) = image_importer::import_images(&mut store, &self.config, &translator).await {
            warn!("⚠️ 图片导入失败: {}", AppError::notice_text(&e, &translator));
        }

        if store.is_empty() {
            warn!("⚠️ 没有找到待导出的文档，程序结束");
            return Ok(());
        }

        let total = store.len();
        log_documents_loaded(total, self.config.max_concurrent_exports);

        let stats = self.export_all(&store).await;

        print_final_stats(stats.success, stats.failed, total, &self.config.output_log_file);

        Ok(())
    }

    /// 导出所有文档，并发数由 Semaphore 控制
    async fn export_all(&self, store: &DocumentStore) -> ProcessingStats {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_exports.max(1)));
        let flow = crate::workflow::ExportFlow::new(&self.config);
        let print_target = BrowserPrintTarget::new(self.browser.clone());
        let print_target = self.config.print_enabled.then_some(&print_target);

        let tasks = store.documents().iter().enumerate().map(|(idx, doc)| {
            let semaphore = semaphore.clone();
            let flow = &flow;
            async move {
                let document_index = idx + 1;
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!("[文档 {}] 获取并发许可失败: {}", document_index, e);
                        return false;
                    }
                };

                match document_processor::process_document(
                    &self.browser,
                    flow,
                    print_target,
                    doc,
                    document_index,
                    &self.config,
                )
                .await
                {
                    Ok(report) => report.succeeded(),
                    Err(e) => {
                        error!("[文档 {}] ❌ 导出过程中发生错误: {:#}", document_index, e);
                        false
                    }
                }
            }
        });

        let results = join_all(tasks).await;

        let success = results.iter().filter(|ok| **ok).count();
        ProcessingStats {
            success,
            failed: results.len() - success,
        }
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
}
