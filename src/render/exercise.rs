use crate::models::document::{Exercise, MAX_DIFFICULTY};
use crate::models::options::ExportOptions;
use crate::render::escape_html;

/// 渲染单道练习为 HTML 片段
///
/// 编号只取决于 `index`（从 0 开始），与练习自身的 id 无关。
/// `content` 原样嵌入，不做任何转义或清洗。
pub fn render_exercise(exercise: &Exercise, index: usize, options: &ExportOptions) -> String {
    let mut html = String::with_capacity(exercise.content.len() + 512);

    html.push_str("<div class=\"exercise\">\n");
    html.push_str("  <div class=\"exercise-header\">\n");
    html.push_str("    <div class=\"exercise-title-block\">\n");
    html.push_str(&format!(
        "      <span class=\"exercise-tag\">EXERCISE {}</span>\n",
        index + 1
    ));
    if options.show_titles {
        html.push_str(&format!(
            "      <h3 class=\"exercise-title\">{}</h3>\n",
            escape_html(&exercise.title)
        ));
    }
    html.push_str("    </div>\n");
    if options.show_difficulty {
        html.push_str(&format!(
            "    <div class=\"star-rating\">{}</div>\n",
            render_stars(exercise.difficulty)
        ));
    }
    html.push_str("  </div>\n");

    if options.show_keywords && exercise.has_keywords() {
        html.push_str("  <div class=\"keywords\">");
        for keyword in &exercise.keywords {
            html.push_str(&format!(
                "<span class=\"keyword-tag\">{}</span>",
                escape_html(keyword)
            ));
        }
        html.push_str("</div>\n");
    }

    html.push_str("  <div class=\"exercise-content tex2jax_process\">\n");
    html.push_str(&exercise.content);
    html.push_str("\n  </div>\n");
    html.push_str("</div>\n");
    html
}

/// 五颗星，前 `difficulty` 颗实心
pub fn render_stars(difficulty: u8) -> String {
    (0..MAX_DIFFICULTY)
        .map(|i| {
            let glyph = if i < difficulty { '★' } else { '☆' };
            format!("<span class=\"star\">{}</span>", glyph)
        })
        .collect()
}
