//! 图片导入 - 编排层
//!
//! 扫描图片目录，逐张交给 `LlmService` 识别，把结果追加到目标文档并保存。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::i18n::Translator;
use crate::services::llm_service::{image_mime_type, load_image_data_url};
use crate::services::{AnalysisOptions, LlmService};
use crate::store::DocumentStore;
use crate::utils::truncate_text;

/// 没有指定目标文档且存储为空时新建的文档标题
const DEFAULT_IMPORT_TITLE: &str = "Imported exercises";

/// 列出目录中可识别的图片，按文件名排序
pub async fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("无法读取图片目录: {}", dir.display()))?;

    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && image_mime_type(&path).is_some() {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// 选出识别结果要追加到的文档，必要时新建
pub fn resolve_target(store: &mut DocumentStore, requested: Option<&str>) -> String {
    if let Some(id) = requested {
        if store.get(id).is_some() {
            return id.to_string();
        }
        warn!("⚠️ 目标文档 {} 不存在，改用默认文档", id);
    }
    match store.documents().first() {
        Some(doc) => doc.id.clone(),
        None => store.add_document(DEFAULT_IMPORT_TITLE, "", ""),
    }
}

/// 识别图片目录并导入练习，返回新增数量
///
/// 单张图片失败只记录警告，不影响其他图片。
pub async fn import_images(
    store: &mut DocumentStore,
    config: &Config,
    translator: &Translator,
) -> Result<usize> {
    let Some(dir) = config.import_images_dir.as_deref() else {
        return Ok(0);
    };

    let images = collect_images(Path::new(dir)).await?;
    if images.is_empty() {
        info!("📁 图片目录 {} 中没有可识别的图片", dir);
        return Ok(0);
    }
    info!("🖼️ 找到 {} 张题目图片，开始识别...", images.len());

    let llm_service = LlmService::new(config);
    if !llm_service.verify_api_key().await {
        warn!(
            "⚠️ {} API Key 不可用，跳过 {} 张图片",
            translator.t("modals.imageUpload.error"),
            images.len()
        );
        return Ok(0);
    }

    let options = AnalysisOptions {
        revise_text: config.revise_text,
        bold_keywords: config.bold_keywords,
    };
    let target = resolve_target(store, config.import_target_document.as_deref());

    let mut added = 0;
    for (index, image) in images.iter().enumerate() {
        let source = image.display().to_string();
        debug!("[图片 {}/{}] {}", index + 1, images.len(), source);

        let draft = match load_image_data_url(&source).await {
            Ok(data_url) => llm_service.extract_exercise(&data_url, options).await,
            Err(e) => Err(e),
        };

        match draft {
            Ok(draft) => {
                info!(
                    "[图片 {}/{}] ✓ {}",
                    index + 1,
                    images.len(),
                    truncate_text(&draft.title, 40)
                );
                if store.add_exercise(&target, draft).is_some() {
                    added += 1;
                }
            }
            Err(e) => {
                warn!(
                    "[图片 {}/{}] {} {}",
                    index + 1,
                    images.len(),
                    translator.t("modals.imageUpload.error"),
                    e
                );
            }
        }
    }

    if added > 0 {
        store.save_document(&target);
        store.flush().await?;
        let count = added.to_string();
        info!(
            "✅ {}",
            translator.t_with("toasts.exercisesAdded", &[("count", count.as_str())])
        );
        if let Some(doc) = store.get(&target) {
            info!(
                "💾 {}",
                translator.t_with("toasts.documentSaved", &[("title", doc.title.as_str())])
            );
        }
    }

    Ok(added)
}
