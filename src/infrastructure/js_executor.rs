//! JS 执行器 - 基础设施层
//!
//! 持有一个隔离的 Page，只暴露"装载 HTML / 执行 JS / 打印"的能力

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::BrowserError;

/// A4 宽 21cm 对应的 CSS 像素
pub const A4_WIDTH_PX: i64 = 794;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / set_content() / print_pdf() 能力
/// - 不认识 Document / Exercise
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 交出 page（用于关闭）
    pub fn into_page(self) -> Page {
        self.page
    }

    /// 固定视口大小，保证测量结果与打印宽度一致
    pub async fn set_viewport(&self, width: i64, height: i64) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::new(width, height, 1.0, false);
        self.page.execute(params).await.map_err(BrowserError::from)?;
        Ok(())
    }

    /// 用给定 HTML 替换整个页面内容
    pub async fn set_content(&self, html: &str) -> Result<()> {
        self.page.set_content(html).await.map_err(BrowserError::from)?;
        Ok(())
    }

    /// 执行 JS 代码并返回 JSON 结果（Promise 会被等待）
    ///
    /// CDP 错误统一转成 `BrowserError::ScriptExecutionFailed`。
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let script: String = js_code.into();
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(BrowserError::from)?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 按页面 CSS 的 `@page` 设置打印为 PDF
    pub async fn print_pdf(&self) -> Result<Vec<u8>> {
        let params = PrintToPdfParams {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            ..Default::default()
        };
        let bytes = self.page.pdf(params).await.map_err(BrowserError::from)?;
        Ok(bytes)
    }
}
