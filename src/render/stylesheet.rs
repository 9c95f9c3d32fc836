//! 打印样式表
//!
//! 固定的基础样式 + 主题覆盖层。纯函数，同样的选项总是得到同样的 CSS。

use crate::models::options::{Columns, ExportOptions, ExportTheme};

const FONT_IMPORT: &str = "@import url('https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&family=Manrope:wght@600;700;800&display=swap');";

/// 与选项无关的基础样式
const BASE_CSS: &str = r#"
.container { max-width: 21cm; margin: 0 auto; }
header { text-align: center; margin-bottom: 2.5rem; }
.doc-title { font-family: 'Manrope', sans-serif; font-size: 2.2em; font-weight: 800; margin: 0; color: #111827; }
.doc-meta { display: flex; justify-content: space-between; width: 100%; max-width: 400px; margin: 0.5rem auto 0; font-size: 0.9em; color: #4b5563; }
.exercise { margin-bottom: 1.2rem; padding-top: 1.2rem; border-top: 1px solid #e5e7eb; }
.exercise:first-child { border-top: none; padding-top: 0; }
.exercise-header { display: flex; justify-content: space-between; align-items: flex-start; margin-bottom: 0.6rem; break-after: avoid; }
.exercise-title-block { display: flex; align-items: baseline; gap: 0.6rem; flex-wrap: wrap; line-height: 1.3; }
.exercise-tag { font-size: 1em; font-weight: 800; color: #111827; letter-spacing: 0.5px; text-transform: uppercase; }
h3.exercise-title { font-family: 'Manrope', sans-serif; font-size: 0.9em; margin: 0; font-weight: 600; font-style: italic; color: #374151; }
.star-rating { font-size: 1em; letter-spacing: 2px; white-space: nowrap; }
.star-rating span { display: inline-block; color: #f59e0b; }
.keywords { margin-top: 0.25rem; margin-bottom: 0.75rem; display: flex; flex-wrap: wrap; gap: 0.5rem; break-after: avoid; }
.keyword-tag { font-size: 0.75em; background-color: #f3f4f6; color: #4b5563; padding: 0.15rem 0.5rem; border-radius: 4px; }
.exercise-content p, .exercise-content ul { margin-top: 0.4rem; margin-bottom: 0.4rem; }
.exercise-content ul { list-style-position: outside; padding-left: 1.5em; }
"#;

/// 多级有序列表：数字 → 小写字母 → 小写罗马数字，每级一个徽章
///
/// 第三级之后的嵌套沿用罗马数字的样式。
const LIST_COUNTERS_CSS: &str = r#"
.exercise-content ol { list-style-type: none; counter-reset: item; padding-left: 0; margin-top: 0.4rem; margin-bottom: 0.4rem; }
.exercise-content ol > li { display: block; position: relative; padding-left: 3.2em; margin-bottom: 0.7em; }
.exercise-content ol > li > p:first-child { display: inline; }
.exercise-content ol > li::before {
  content: counter(item, decimal);
  counter-increment: item;
  position: absolute; left: 0; top: 0;
  display: flex; align-items: center; justify-content: center;
  width: 2.2em; height: 2.2em; border-radius: 8px;
  font-weight: 600; font-size: 0.85em;
  color: #1d4ed8; border: 2px solid #93c5fd; background-color: transparent;
}
.exercise-content ol ol { counter-reset: subitem; margin-top: 0.6em; margin-left: 0; }
.exercise-content ol ol > li { padding-left: 3.2em; }
.exercise-content ol ol > li::before { content: counter(subitem, lower-alpha); counter-increment: subitem; color: #1e40af; border-color: #bfdbfe; }
.exercise-content ol ol ol { counter-reset: subsubitem; }
.exercise-content ol ol ol > li::before { content: counter(subsubitem, lower-roman); counter-increment: subsubitem; border-style: dashed; }
"#;

/// A4，页边距 2cm
const PRINT_CSS: &str = r#"
@media print {
  @page { size: A4; margin: 2cm; }
  body { padding: 0; font-weight: normal !important; }
}
"#;

const INK_SAVER_CSS: &str = r#"
body { color: #404040; }
.doc-title { color: #000000; }
.doc-meta { color: #6b7280; }
.exercise { border-top-color: #e5e7eb; }
.exercise-tag, h3.exercise-title { color: #111827; }
.star-rating span { color: #a1a1aa; }
.keyword-tag { background-color: transparent; color: #525252; border: 1px solid #d4d4d8; }
.exercise-content ol > li::before { color: #525252; border-color: #a1a1aa; background-color: transparent; }
.exercise-content ol ol > li::before { color: #737373; border-color: #d4d4d8; background-color: transparent; }
"#;

const HIGH_CONTRAST_CSS: &str = r#"
body { background-color: #ffffff; color: #000000; font-weight: 600; }
.doc-title { color: #000000; }
.doc-meta { color: #000000; }
.exercise { border-top: 2px solid #000000; }
.exercise-tag, h3.exercise-title { color: #000000; }
.star-rating span { color: #000000; }
.keyword-tag { background-color: transparent; color: #000000; border: 1px solid #000000; font-weight: 600; }
.exercise-content ol > li::before { color: #000000; border-color: #000000; border-width: 2px; background-color: transparent; }
.exercise-content ol ol > li::before { color: #000000; border-color: #000000; border-width: 1px; background-color: transparent; }
"#;

/// 主题覆盖层，`default` 没有覆盖
pub fn theme_overlay(theme: ExportTheme) -> &'static str {
    match theme {
        ExportTheme::Default => "",
        ExportTheme::InkSaver => INK_SAVER_CSS,
        ExportTheme::HighContrast => HIGH_CONTRAST_CSS,
    }
}

/// 生成完整的 CSS 文本（不含 `<style>` 标签）
pub fn build_stylesheet(options: &ExportOptions) -> String {
    let body_css = format!(
        r#"
body {{
  font-family: 'Inter', sans-serif;
  line-height: 1.5;
  margin: 0;
  padding: 2cm;
  font-size: {font_size}pt;
  background-color: #ffffff;
  color: #1f2937;
  -webkit-print-color-adjust: exact;
  print-color-adjust: exact;
  -webkit-font-smoothing: antialiased;
  text-rendering: optimizeLegibility;
}}"#,
        font_size = options.font_size.points()
    );

    let column_rule = match options.columns {
        Columns::Two => " column-rule: 1px solid #d1d5db;",
        Columns::One => "",
    };
    let content_css = format!(
        "\n.content {{ column-count: {}; column-gap: 1.5cm;{} }}\n",
        options.columns.count(),
        column_rule
    );

    let mut css = String::with_capacity(6 * 1024);
    css.push_str(FONT_IMPORT);
    css.push_str(&body_css);
    css.push_str(BASE_CSS);
    css.push_str(&content_css);
    css.push_str(LIST_COUNTERS_CSS);
    css.push_str(PRINT_CSS);
    css.push_str(theme_overlay(options.theme));
    css
}
