//! 导出上下文
//!
//! 封装"我正在导出第几份文档"这一信息，只用于日志

use std::fmt::Display;

/// 导出上下文
#[derive(Debug, Clone)]
pub struct ExportCtx {
    /// 文档ID
    pub document_id: String,

    /// 文档标题
    pub title: String,

    /// 文档在本次批量中的序号（从1开始）
    pub document_index: usize,
}

impl ExportCtx {
    pub fn new(document_id: String, title: String, document_index: usize) -> Self {
        Self {
            document_id,
            title,
            document_index,
        }
    }
}

impl Display for ExportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 #{} {}]", self.document_index, self.title)
    }
}
