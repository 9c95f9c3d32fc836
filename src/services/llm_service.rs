//! LLM 服务 - 业务能力层
//!
//! 只负责"把题目图片识别成结构化练习"，不关心文档和流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（Gemini 的 OpenAI 兼容端点等）
//! - 图片以 base64 data URL 形式随用户消息发送

use std::path::Path;

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use base64::Engine as _;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::models::document::{clamp_difficulty, parse_keywords, ExerciseDraft};

const BASE_INSTRUCTIONS: [&str; 3] = [
    "You are an expert in mathematics education. Your task is to analyze an image of a math exercise and extract its content into a structured JSON object with exactly the keys \"title\" (string), \"difficulty\" (integer from 1 to 5), \"keywords\" (array of 3-5 strings) and \"content\" (string).",
    "IMPORTANT: Detect the language of the text in the image and provide your entire response (including title, keywords, and content) in that same language. DO NOT TRANSLATE the exercise.",
    "The 'content' field must be valid, semantic HTML. Use <p> for paragraphs, and nested <ol> or <ul> for lists (questions, sub-questions). All mathematical formulas must be in LaTeX, using \\( ... \\) for inline math and \\[ ... \\] for display math. Do not put <p> tags inside <li> tags. Reply with the JSON object only.",
];

const REVISE_INSTRUCTION: &str = "Proofread and correct the spelling, grammar, and vocabulary of the content to ensure professional quality.";

const BOLD_KEYWORDS_INSTRUCTION: &str = "In the HTML 'content' field, bold the keywords you've identified (from the 'keywords' array) by wrapping them in `<strong>` tags.";

const EXTRACT_PROMPT: &str = "Extract the exercise from this image, conforming to the JSON schema.";

/// 识别选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// 让模型顺便校对文字
    pub revise_text: bool,
    /// 在正文中加粗关键词
    pub bold_keywords: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            revise_text: true,
            bold_keywords: true,
        }
    }
}

/// LLM 服务
///
/// 职责：
/// - 调用视觉模型识别题目图片
/// - 校验并规整返回的 JSON
/// - 不认识 Document，不关心识别结果加到哪里
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    has_api_key: bool,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            has_api_key: !config.llm_api_key.trim().is_empty(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `image_urls`: 图片 URL 或 data URL 列表，会追加到用户消息中
    /// - `max_tokens`: 输出上限
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        image_urls: &[String],
        max_tokens: u32,
    ) -> Result<String> {
        if !self.has_api_key {
            return Err(LlmError::MissingApiKey.into());
        }

        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符, 图片 {} 张", user_message.len(), image_urls.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if image_urls.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()?
        } else {
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = Vec::new();
            for url in image_urls {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.clone(),
                            detail: Some(ImageDetail::High),
                        },
                    },
                ));
            }
            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: user_message.to_string(),
                },
            ));

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()?
        };
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.2)
            .max_tokens(max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            }
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 识别一张题目图片
    ///
    /// # 参数
    /// - `image_data_url`: `data:<mime>;base64,...` 或可访问的图片 URL
    /// - `options`: 校对 / 加粗选项
    pub async fn extract_exercise(
        &self,
        image_data_url: &str,
        options: AnalysisOptions,
    ) -> Result<ExerciseDraft> {
        let system_message = build_system_instructions(options);
        let response = self
            .send_to_llm(
                EXTRACT_PROMPT,
                Some(&system_message),
                &[image_data_url.to_string()],
                4096,
            )
            .await?;

        let exercise = parse_exercise_response(&response)?;
        debug!(
            "识别完成: {} (难度 {}, 关键词 {} 个)",
            exercise.title,
            exercise.difficulty,
            exercise.keywords.len()
        );
        Ok(exercise)
    }

    /// 用一个极小的请求验证 API Key 是否可用
    pub async fn verify_api_key(&self) -> bool {
        match self.send_to_llm("ping", None, &[], 1).await {
            Ok(_) => true,
            Err(e) => {
                warn!("API Key 验证失败: {}", e);
                false
            }
        }
    }
}

/// 按选项拼接系统指令
pub fn build_system_instructions(options: AnalysisOptions) -> String {
    let mut parts: Vec<&str> = BASE_INSTRUCTIONS.to_vec();
    if options.revise_text {
        parts.push(REVISE_INSTRUCTION);
    }
    if options.bold_keywords {
        parts.push(BOLD_KEYWORDS_INSTRUCTION);
    }
    parts.join(" ")
}

/// 解析模型返回的 JSON，容忍 markdown 代码块包裹
pub fn parse_exercise_response(response: &str) -> Result<ExerciseDraft, LlmError> {
    let invalid = |reason: &str| LlmError::InvalidExercise {
        reason: reason.to_string(),
    };

    let fence = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$")
        .map_err(|e| invalid(&e.to_string()))?;
    let body = fence
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response);

    let value: JsonValue = serde_json::from_str(body).map_err(|e| invalid(&e.to_string()))?;

    let title = value
        .get("title")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| invalid("missing string field 'title'"))?;
    let content = value
        .get("content")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| invalid("missing string field 'content'"))?;
    let difficulty = value
        .get("difficulty")
        .and_then(JsonValue::as_i64)
        .map(clamp_difficulty)
        .unwrap_or(3);
    let keywords = match value.get("keywords") {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        // 模型偶尔把关键词写成一段逗号分隔的文本
        Some(JsonValue::String(text)) => parse_keywords(text),
        _ => Vec::new(),
    };

    Ok(ExerciseDraft {
        title: title.trim().to_string(),
        difficulty,
        keywords,
        content: content.to_string(),
    })
}

/// 根据扩展名推断图片 MIME 类型
pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// 编码成 data URL
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// 读取本地图片或下载远程图片，转成 data URL
pub async fn load_image_data_url(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::get(source)
            .await
            .with_context(|| format!("无法下载图片: {}", source))?
            .error_for_status()
            .with_context(|| format!("下载图片失败: {}", source))?;
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .or_else(|| image_mime_type(Path::new(source)).map(str::to_string))
            .unwrap_or_else(|| "image/png".to_string());
        let bytes = response.bytes().await?;
        return Ok(to_data_url(&mime, &bytes));
    }

    let path = Path::new(source);
    let mime = image_mime_type(path)
        .with_context(|| format!("不支持的图片格式: {}", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("无法读取图片: {}", path.display()))?;
    Ok(to_data_url(mime, &bytes))
}
