//! 错误类型
//!
//! 导出流程中所有可恢复的错误都在这里定义。
//! 服务层与编排层统一使用 `anyhow::Result`，需要区分用户提示时再 `downcast_ref`。

use thiserror::Error;

use crate::i18n::Translator;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 导出相关错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 导入数据错误
    #[error("导入错误: {0}")]
    Import(#[from] ImportError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动无头浏览器失败
    #[error("启动无头浏览器失败: {message}")]
    LaunchFailed { message: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 导出流程错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 无法打开打印上下文（相当于浏览器拦截了弹窗）
    #[error("无法打开打印窗口: {reason}")]
    BlockedPopup { reason: String },
    /// 高度测量失败
    #[error("测量渲染高度失败: {reason}")]
    MeasurementFailed { reason: String },
    /// 打印失败
    #[error("打印失败: {reason}")]
    PrintFailed { reason: String },
    /// 保存下载文件失败
    #[error("保存文件失败 ({path}): {source}")]
    DownloadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 导入数据错误
#[derive(Debug, Error)]
pub enum ImportError {
    /// 数据格式不正确
    #[error("导入数据格式错误 ({source_name}): {reason}")]
    MalformedImportData { source_name: String, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 不支持的文件格式
    #[error("不支持的文件格式: {path}")]
    UnsupportedFormat { path: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 缺少 API Key
    #[error("缺少 API Key")]
    MissingApiKey,
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 返回的 JSON 结构不符合要求
    #[error("LLM返回的JSON结构无效: {reason}")]
    InvalidExercise { reason: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        }
    }
}

impl AppError {
    /// 面向用户的提示文本（相当于界面上的 toast）
    pub fn user_message(&self, translator: &Translator) -> String {
        match self {
            AppError::Export(ExportError::BlockedPopup { .. }) => translator.t("toasts.popupError"),
            AppError::Import(ImportError::MalformedImportData { .. }) => {
                translator.t("toasts.importError")
            }
            other => other.to_string(),
        }
    }

    /// 从 anyhow 错误链中找出可以给用户看的错误
    pub fn notice_text(err: &anyhow::Error, translator: &Translator) -> String {
        if let Some(export) = err.downcast_ref::<ExportError>() {
            if matches!(export, ExportError::BlockedPopup { .. }) {
                return translator.t("toasts.popupError");
            }
        }
        if err.downcast_ref::<ImportError>().is_some() {
            return translator.t("toasts.importError");
        }
        if let Some(app) = err.downcast_ref::<AppError>() {
            return app.user_message(translator);
        }
        err.to_string()
    }
}
