/// 日志工具模块
///
/// 提供运行日志文件和统计输出的辅助函数
use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::workflow::Notice;

/// 初始化日志文件，写入本次运行的抬头
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n文档导出日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 追加一条提示到日志文件
pub fn append_notice(log_file_path: &str, title: &str, notice: &Notice) -> Result<()> {
    use std::io::Write;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;
    writeln!(
        file,
        "[{}] [{:?}] {} - {}",
        chrono::Local::now().format("%H:%M:%S"),
        notice.level,
        title,
        notice.message
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(max_concurrent: usize, print_enabled: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文档导出模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("🖨️ 打印 PDF: {}", if print_enabled { "是" } else { "否" });
    info!("{}", "=".repeat(60));
}

/// 记录文档加载信息
pub fn log_documents_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待导出的文档", total);
    info!("📋 同时最多导出 {} 个\n", max_concurrent);
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部导出完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_characters() {
        assert_eq!(truncate_text("二次方程求解", 4), "二次方程...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn log_file_gets_header_and_notices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export_log.txt");
        let path = path.to_str().unwrap();

        init_log_file(path).unwrap();
        append_notice(path, "Algebra", &Notice::error("boom")).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with(&"=".repeat(60)));
        assert!(text.contains("文档导出日志"));
        assert!(text.contains("Algebra - boom"));
    }
}
