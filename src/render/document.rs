use chrono::{DateTime, Locale, Utc};

use crate::i18n::Language;
use crate::models::document::Document;
use crate::models::options::ExportOptions;
use crate::models::settings::AppSettings;
use crate::render::exercise::render_exercise;
use crate::render::stylesheet::build_stylesheet;
use crate::render::{escape_html, MATHJAX_BOOTSTRAP};

/// 生成可独立打开的完整 HTML 文档
///
/// 同样的输入永远得到逐字节相同的输出。
pub fn assemble_document(doc: &Document, settings: &AppSettings, options: &ExportOptions) -> String {
    let exercises: String = doc
        .exercises
        .iter()
        .enumerate()
        .map(|(i, ex)| render_exercise(ex, i, options))
        .collect();

    let title = escape_html(&doc.title);

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
{styles}
</style>
{mathjax}
</head>
<body>
<div class="container">
<header>
<h1 class="doc-title">{title}</h1>
<div class="doc-meta">
<span>{name}</span>
<span>{year}</span>
<span>{date}</span>
</div>
</header>
<main class="content">
{exercises}</main>
</div>
</body>
</html>
"#,
        lang = settings.language.tag(),
        title = title,
        styles = build_stylesheet(options),
        mathjax = MATHJAX_BOOTSTRAP,
        name = escape_html(settings.header_name(&doc.class_name)),
        year = escape_html(&doc.school_year),
        date = format_long_date(&doc.date, settings.language),
        exercises = exercises,
    )
}

/// 按语言输出带完整月份名的日期，例如 `September 2, 2024` / `2 septembre 2024`
pub fn format_long_date(date: &DateTime<Utc>, language: Language) -> String {
    let (pattern, locale) = match language {
        Language::En => ("%B %-d, %Y", Locale::en_US),
        Language::Fr => ("%-d %B %Y", Locale::fr_FR),
    };
    date.format_localized(pattern, locale).to_string()
}
