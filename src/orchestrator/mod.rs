//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量导出和流程调度。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量导出处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载文档存储
//! - 控制并发数量（Semaphore）
//! - 持有 Browser
//! - 输出全局统计信息
//!
//! ### `document_processor` - 单个文档处理器
//! - 为文档开一个专用的测量页面
//! - 调用 ExportFlow
//! - 输出并记录提示
//!
//! ### `file_importer` - 文档文件
//! - 打开文档存储，损坏时给出提示而不是崩溃
//! - 合并 `IMPORT_FILE` 指定的 JSON 导入文件
//!
//! ### `image_importer` - 图片导入
//! - 扫描图片目录，调用 LlmService 识别
//! - 把练习追加到目标文档并保存
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Document>)
//!     ↓
//! document_processor (处理单个 Document)
//!     ↓
//! workflow::ExportFlow / PrintFlow
//!     ↓
//! services (能力层：pagination / printer / download / llm)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod batch_processor;
pub mod document_processor;
pub mod file_importer;
pub mod image_importer;

// 重新导出主要类型
pub use batch_processor::App;
pub use document_processor::process_document;
pub use file_importer::{import_file, open_store};
pub use image_importer::import_images;
