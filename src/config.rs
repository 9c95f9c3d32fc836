use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::i18n::Language;
use crate::models::options::{Columns, ExportOptions, ExportTheme, FontSize};
use crate::models::settings::AppSettings;
use crate::services::pagination::PAGE_HEIGHT_PX;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 浏览器 ---
    /// 已启动浏览器的调试端口；为空时自行启动无头浏览器
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径；为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,

    // --- 文件 ---
    /// 文档存储文件（.json / .toml）
    pub documents_file: String,
    /// 导出目录
    pub output_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 同时导出的文档数量
    pub max_concurrent_exports: usize,

    // --- 设置与导出选项 ---
    pub settings: AppSettings,
    pub export_options: ExportOptions,
    /// 是否打印为 PDF
    pub print_enabled: bool,

    // --- 分页与打印时序 ---
    pub page_height_px: f64,
    pub measure_settle_delay: Duration,
    pub typeset_timeout: Duration,
    pub print_settle_delay: Duration,

    // --- 导入 ---
    /// 启动时合并进文档存储的 JSON 导入文件
    pub import_file: Option<String>,
    /// 待识别的题目图片目录
    pub import_images_dir: Option<String>,
    /// 识别结果追加到哪个文档
    pub import_target_document: Option<String>,
    pub revise_text: bool,
    pub bold_keywords: bool,

    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: None,
            chrome_executable: None,
            documents_file: "documents.json".to_string(),
            output_dir: "exports".to_string(),
            output_log_file: "export_log.txt".to_string(),
            verbose_logging: false,
            max_concurrent_exports: 1,
            settings: AppSettings::default(),
            export_options: ExportOptions::default(),
            print_enabled: true,
            page_height_px: PAGE_HEIGHT_PX,
            measure_settle_delay: Duration::from_millis(200),
            typeset_timeout: Duration::from_millis(10_000),
            print_settle_delay: Duration::from_millis(500),
            import_file: None,
            import_images_dir: None,
            import_target_document: None,
            revise_text: true,
            bold_keywords: true,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量读取配置，非法值记录警告并使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 以任意来源读取配置，便于测试
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let settings = AppSettings {
            language: parsed(&get, "LANGUAGE", default.settings.language, "en|fr"),
            teacher_name: get("TEACHER_NAME"),
            school_id: get("SCHOOL_ID"),
            ..default.settings.clone()
        };

        let defaults = default.export_options;
        let export_options = ExportOptions {
            columns: parsed::<Columns>(&get, "EXPORT_COLUMNS", defaults.columns, "1|2"),
            font_size: parsed::<FontSize>(&get, "EXPORT_FONT_SIZE", defaults.font_size, "10|12|14"),
            theme: parsed::<ExportTheme>(
                &get,
                "EXPORT_THEME",
                defaults.theme,
                "default|ink-saver|high-contrast",
            ),
            include_solutions: parsed(&get, "INCLUDE_SOLUTIONS", defaults.include_solutions, "bool"),
            show_difficulty: parsed(&get, "SHOW_DIFFICULTY", defaults.show_difficulty, "bool"),
            show_keywords: parsed(&get, "SHOW_KEYWORDS", defaults.show_keywords, "bool"),
            show_titles: parsed(&get, "SHOW_TITLES", defaults.show_titles, "bool"),
        };

        let millis = |name: &str, fallback: Duration| {
            Duration::from_millis(parsed(&get, name, fallback.as_millis() as u64, "u64"))
        };

        Self {
            browser_debug_port: get("BROWSER_DEBUG_PORT").and_then(|v| parse_or_warn("BROWSER_DEBUG_PORT", &v, "u16")),
            chrome_executable: get("CHROME_EXECUTABLE"),
            documents_file: get("DOCUMENTS_FILE").unwrap_or(default.documents_file),
            output_dir: get("OUTPUT_DIR").unwrap_or(default.output_dir),
            output_log_file: get("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: parsed(&get, "VERBOSE_LOGGING", default.verbose_logging, "bool"),
            max_concurrent_exports: parsed(&get, "MAX_CONCURRENT_EXPORTS", default.max_concurrent_exports, "usize").max(1),
            settings,
            export_options,
            print_enabled: parsed(&get, "EXPORT_PDF", default.print_enabled, "bool"),
            page_height_px: parsed(&get, "PAGE_HEIGHT_PX", default.page_height_px, "f64"),
            measure_settle_delay: millis("MEASURE_SETTLE_MS", default.measure_settle_delay),
            typeset_timeout: millis("TYPESET_TIMEOUT_MS", default.typeset_timeout),
            print_settle_delay: millis("PRINT_SETTLE_MS", default.print_settle_delay),
            import_file: get("IMPORT_FILE"),
            import_images_dir: get("IMPORT_IMAGES_DIR"),
            import_target_document: get("IMPORT_TARGET_DOCUMENT"),
            revise_text: parsed(&get, "REVISE_TEXT", default.revise_text, "bool"),
            bold_keywords: parsed(&get, "BOLD_KEYWORDS", default.bold_keywords, "bool"),
            llm_api_key: get("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: get("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: get("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }
}

fn parsed<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    fallback: T,
    expected_type: &str,
) -> T {
    get(name)
        .and_then(|v| parse_or_warn(name, &v, expected_type))
        .unwrap_or(fallback)
}

fn parse_or_warn<T: FromStr>(name: &str, value: &str, expected_type: &str) -> Option<T> {
    match value.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            let err = ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: value.to_string(),
                expected_type: expected_type.to_string(),
            };
            warn!("⚠️ {}，使用默认值", err);
            None
        }
    }
}
