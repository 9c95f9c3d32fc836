//! 文档文件 - 编排层
//!
//! 打开文档存储，并把 `IMPORT_FILE` 指定的 JSON 合并进来。
//! 两处失败都转成用户提示，不让进程崩溃。

use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, FileError};
use crate::i18n::Translator;
use crate::store::DocumentStore;
use crate::workflow::Notice;

/// 打开文档存储
///
/// 文件无法读取或格式错误时返回错误提示，调用方决定是否继续。
/// 损坏的文件保持原样，不会被空存储覆盖。
pub async fn open_store(path: &str, translator: &Translator) -> Result<DocumentStore, Notice> {
    match DocumentStore::open(path).await {
        Ok(store) => Ok(store),
        Err(e) => {
            warn!("⚠️ 无法加载文档文件 {}: {:#}", path, e);
            Err(Notice::error(AppError::notice_text(&e, translator)))
        }
    }
}

/// 导入 `config.import_file`，返回给用户的提示；未配置时返回 None
///
/// 解析失败时存储和文档文件都保持不变。
pub async fn import_file(
    store: &mut DocumentStore,
    config: &Config,
    translator: &Translator,
) -> Option<Notice> {
    let path = config.import_file.as_deref()?;
    info!("📥 正在导入: {}", path);

    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(source) => {
            let err = anyhow::Error::new(FileError::ReadFailed {
                path: path.to_string(),
                source,
            });
            warn!("⚠️ {}", err);
            return Some(Notice::error(AppError::notice_text(&err, translator)));
        }
    };

    let source_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    let count = match store.import_from_text(&text, &source_name) {
        Ok(count) => count,
        Err(e) => {
            warn!("⚠️ {}", e);
            let err = anyhow::Error::new(e);
            return Some(Notice::error(AppError::notice_text(&err, translator)));
        }
    };

    if let Err(e) = store.flush().await {
        warn!("⚠️ 导入后保存文档文件失败: {:#}", e);
        return Some(Notice::error(AppError::notice_text(&e, translator)));
    }

    info!("✓ 导入了 {} 个文档", count);
    Some(Notice::success(translator.t("toasts.importSuccess")))
}
