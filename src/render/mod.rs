//! 渲染层（纯函数）
//!
//! - `stylesheet` - 根据导出选项生成 CSS
//! - `exercise` - 单道练习 → HTML 片段
//! - `document` - 文档 → 完整 HTML
//!
//! 本层不做 IO，相同输入得到逐字节相同的输出。

pub mod document;
pub mod exercise;
pub mod stylesheet;

pub use document::{assemble_document, format_long_date};
pub use exercise::{render_exercise, render_stars};
pub use stylesheet::build_stylesheet;

/// MathJax 运行时配置与脚本引用
///
/// 行内公式 `\( \)`，独立公式 `\[ \]`。`startup.promise` 是打印前等待的完成信号。
pub const MATHJAX_BOOTSTRAP: &str = r#"<script>
window.MathJax = {
  tex: {
    inlineMath: [['\\(', '\\)']],
    displayMath: [['\\[', '\\]']],
    processEscapes: true,
    packages: ['base', 'ams', 'noerrors', 'noundefined']
  },
  chtml: {
    fontURL: 'https://cdn.jsdelivr.net/npm/mathjax@3/es5/output/chtml/fonts/woff-v2'
  }
};
</script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-chtml.js"></script>"#;

/// 转义纯文本字段（标题、关键词、页眉信息）
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"a < b & "c" 'd'"#),
            "a &lt; b &amp; &quot;c&quot; &#39;d&#39;"
        );
        assert_eq!(escape_html("Équations"), "Équations");
    }
}
