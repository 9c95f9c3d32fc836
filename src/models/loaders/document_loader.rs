use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;

use crate::error::{FileError, ImportError};
use crate::models::document::Document;

/// TOML 文件的顶层结构
#[derive(Debug, Default, Serialize, Deserialize)]
struct DocumentFile {
    #[serde(default)]
    documents: Vec<Document>,
}

/// 解析导入的 JSON：既可以是文档数组，也可以是单个文档对象
pub fn parse_import(text: &str, source_name: &str) -> Result<Vec<Document>, ImportError> {
    let malformed = |reason: String| ImportError::MalformedImportData {
        source_name: source_name.to_string(),
        reason,
    };

    let value: JsonValue = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;

    match value {
        JsonValue::Array(_) => {
            serde_json::from_value::<Vec<Document>>(value).map_err(|e| malformed(e.to_string()))
        }
        JsonValue::Object(_) => serde_json::from_value::<Document>(value)
            .map(|doc| vec![doc])
            .map_err(|e| malformed(e.to_string())),
        other => Err(malformed(format!(
            "expected an array or an object, got {}",
            json_kind(&other)
        ))),
    }
}

/// 解析 `[[documents]]` 形式的 TOML
pub fn parse_toml_documents(text: &str, source_name: &str) -> Result<Vec<Document>, ImportError> {
    toml::from_str::<DocumentFile>(text)
        .map(|file| file.documents)
        .map_err(|e| ImportError::MalformedImportData {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
}

/// 按扩展名从文件加载文档列表
pub async fn load_documents_file(path: &Path) -> Result<Vec<Document>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

    let name = path.display().to_string();
    let documents = match extension(path).as_deref() {
        Some("json") => parse_import(&content, &name)?,
        Some("toml") => parse_toml_documents(&content, &name)?,
        _ => return Err(FileError::UnsupportedFormat { path: name }.into()),
    };

    tracing::debug!("从 {} 加载了 {} 个文档", path.display(), documents.len());
    Ok(documents)
}

/// 按扩展名把文档列表写回文件
pub async fn save_documents_file(path: &Path, documents: &[Document]) -> Result<()> {
    let name = path.display().to_string();
    let content = match extension(path).as_deref() {
        Some("json") => serde_json::to_string_pretty(documents)?,
        Some("toml") => toml::to_string_pretty(&DocumentFile {
            documents: documents.to_vec(),
        })
        .with_context(|| format!("无法序列化TOML: {}", name))?,
        _ => return Err(FileError::UnsupportedFormat { path: name }.into()),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }

    fs::write(path, content)
        .await
        .map_err(|source| FileError::WriteFailed { path: name, source })?;
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
