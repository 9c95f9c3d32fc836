//! # Mathify Export
//!
//! 把数学练习文档导出为可打印的 HTML / PDF
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - page owner，提供 set_content() / eval() / print_pdf()
//!
//! ### ② 业务能力层（Services + Render）
//! - `render/` - 样式表、练习片段、完整文档的纯函数组装
//! - `services/` - 分页估算、打印、下载、LLM 图片识别
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份文档"的完整导出流程
//! - `ExportCtx` - 上下文封装（document_id + 序号）
//! - `ExportFlow` - 组装 → 分页预览 → 下载 → 打印
//! - `PrintFlow` - 打印状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量导出，管理浏览器和并发
//! - `orchestrator/document_processor` - 单个文档的资源准备
//! - `orchestrator/image_importer` - 图片识别导入
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod i18n;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod render;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::AppError;
pub use i18n::{Language, Translator};
pub use infrastructure::JsExecutor;
pub use models::{AppSettings, Document, Exercise, ExportOptions};
pub use orchestrator::App;
pub use render::assemble_document;
pub use store::DocumentStore;
pub use workflow::{ExportCtx, ExportFlow, PrintFlow};
