//! 下载能力 - 业务能力层
//!
//! 把导出的 HTML 保存为 `<slug>.html`。
//! 同名文件已存在时和浏览器下载一样改名为 `<slug> (1).html`。
//! 先写入临时暂存文件再改名，暂存文件在保存结束后立即释放。

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::ExportError;

/// 下载文件的 MIME 类型
pub const HTML_MIME: &str = "text/html";
pub const PDF_MIME: &str = "application/pdf";

/// 同名文件最多尝试的编号
const MAX_DUPLICATE_INDEX: usize = 999;

/// 标题全部被清掉时使用的文件名
const FALLBACK_SLUG: &str = "untitled";

/// 文件名用的 slug
///
/// 空白、路径分隔符、Windows 保留字符和控制字符都替换为 `_`，并去掉开头的 `.`，
/// 保证结果只是输出目录下的一个文件名。
pub fn slugify_title(title: &str) -> String {
    let slug: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();
    let slug = slug.trim_start_matches('.');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// 一次下载的产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub stem: String,
    pub extension: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    /// 把 HTML 字符串打包成下载产物
    pub fn html(title: &str, html: &str) -> Self {
        Self {
            stem: slugify_title(title),
            extension: "html",
            mime: HTML_MIME,
            bytes: html.as_bytes().to_vec(),
        }
    }

    /// 带分页标记的预览文件 `<slug>.preview.html`
    pub fn preview(title: &str, html: &str) -> Self {
        Self {
            stem: slugify_title(title),
            extension: "preview.html",
            mime: HTML_MIME,
            bytes: html.as_bytes().to_vec(),
        }
    }

    pub fn pdf(title: &str, bytes: Vec<u8>) -> Self {
        Self {
            stem: slugify_title(title),
            extension: "pdf",
            mime: PDF_MIME,
            bytes,
        }
    }

    /// 例如 `Algebra_Test!.html`
    pub fn file_name(&self) -> String {
        self.numbered_file_name(0)
    }

    /// 第 n 个重名候选：`Quiz.html`、`Quiz (1).html`、`Quiz (2).html`……
    pub fn numbered_file_name(&self, n: usize) -> String {
        if n == 0 {
            format!("{}.{}", self.stem, self.extension)
        } else {
            format!("{} ({}).{}", self.stem, n, self.extension)
        }
    }
}

/// 把产物保存到目录中，返回最终路径
///
/// 目标文件名用 `create_new` 占位，并发导出同名文档时也不会互相覆盖。
pub async fn save_artifact(dir: &Path, artifact: &DownloadArtifact) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .map_err(|source| ExportError::DownloadFailed {
            path: dir.display().to_string(),
            source,
        })?;

    let target = reserve_target(dir, artifact)
        .await
        .map_err(|source| ExportError::DownloadFailed {
            path: dir.join(artifact.file_name()).display().to_string(),
            source,
        })?;
    let staging = staging_path(&target);

    let result = write_via_staging(&staging, &target, &artifact.bytes).await;

    // 暂存文件无论成功与否都要释放
    if fs::try_exists(&staging).await.unwrap_or(false) {
        if let Err(e) = fs::remove_file(&staging).await {
            warn!("清理暂存文件失败 {}: {}", staging.display(), e);
        }
    }

    if let Err(source) = result {
        // 释放占位的空文件
        let _ = fs::remove_file(&target).await;
        return Err(ExportError::DownloadFailed {
            path: target.display().to_string(),
            source,
        }
        .into());
    }

    debug!(
        "已保存 {} ({}, {} 字节)",
        target.display(),
        artifact.mime,
        artifact.bytes.len()
    );
    Ok(target)
}

/// 找到第一个不存在的文件名并原子地创建它
async fn reserve_target(dir: &Path, artifact: &DownloadArtifact) -> io::Result<PathBuf> {
    for n in 0..=MAX_DUPLICATE_INDEX {
        let candidate = dir.join(artifact.numbered_file_name(n));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("同名文件超过 {} 个", MAX_DUPLICATE_INDEX),
    ))
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.part", name))
}

async fn write_via_staging(staging: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::write(staging, bytes).await?;
    fs::rename(staging, target).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn file_names(dir: &Path) -> Vec<String> {
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        names
    }

    #[test]
    fn slug_replaces_every_whitespace() {
        assert_eq!(DownloadArtifact::html("Algebra Test!", "").file_name(), "Algebra_Test!.html");
        assert_eq!(slugify_title("a\tb\nc  d"), "a_b_c__d");
        assert!(!slugify_title("Contrôle  de maths").contains(char::is_whitespace));
        assert_eq!(
            DownloadArtifact::preview("Algebra Test!", "").file_name(),
            "Algebra_Test!.preview.html"
        );
        assert_eq!(DownloadArtifact::pdf("Algebra Test!", Vec::new()).mime, PDF_MIME);
    }

    #[test]
    fn slug_never_leaves_the_output_directory() {
        assert_eq!(slugify_title("Fractions 1/2"), "Fractions_1_2");
        assert_eq!(slugify_title("../x"), "_x");
        assert_eq!(slugify_title(r#"a\b:c*d?e"f<g>h|i"#), "a_b_c_d_e_f_g_h_i");
        assert_eq!(slugify_title("tab\u{7}bell"), "tab_bell");
        assert_eq!(slugify_title(".hidden"), "hidden");
        assert_eq!(slugify_title("..."), "untitled");
        assert_eq!(slugify_title(""), "untitled");
    }

    #[tokio::test]
    async fn saves_file_and_leaves_no_staging_behind() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = DownloadArtifact::html("Algebra Test!", "<html></html>");
        assert_eq!(artifact.mime, "text/html");

        let path = save_artifact(dir.path(), &artifact).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "Algebra_Test!.html");
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "<html></html>");

        assert_eq!(file_names(dir.path()).await, vec!["Algebra_Test!.html".to_string()]);
    }

    #[tokio::test]
    async fn title_with_slash_is_saved_inside_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = DownloadArtifact::html("Fractions 1/2", "<p>half</p>");
        let path = save_artifact(dir.path(), &artifact).await.unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        assert_eq!(path.file_name().unwrap(), "Fractions_1_2.html");
    }

    #[tokio::test]
    async fn same_title_gets_numbered_copy() {
        let dir = tempfile::tempdir().unwrap();
        let first = save_artifact(dir.path(), &DownloadArtifact::html("Quiz", "FIRST"))
            .await
            .unwrap();
        let second = save_artifact(dir.path(), &DownloadArtifact::html("Quiz", "SECOND"))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "Quiz (1).html");
        assert_eq!(tokio::fs::read_to_string(&first).await.unwrap(), "FIRST");
        assert_eq!(tokio::fs::read_to_string(&second).await.unwrap(), "SECOND");
        assert_eq!(
            file_names(dir.path()).await,
            vec!["Quiz (1).html".to_string(), "Quiz.html".to_string()]
        );
    }

    #[tokio::test]
    async fn concurrent_saves_do_not_overwrite_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let a = DownloadArtifact::html("Quiz", "A");
        let b = DownloadArtifact::html("Quiz", "B");
        let (pa, pb) = tokio::join!(save_artifact(dir.path(), &a), save_artifact(dir.path(), &b));
        let (pa, pb) = (pa.unwrap(), pb.unwrap());

        assert_ne!(pa, pb);
        assert_eq!(tokio::fs::read_to_string(&pa).await.unwrap(), "A");
        assert_eq!(tokio::fs::read_to_string(&pb).await.unwrap(), "B");
    }
}
