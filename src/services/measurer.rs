//! 高度测量能力
//!
//! `HeightMeasurer` 把"在隔离的渲染面上量出 HTML 的高度"抽象出来，
//! 分页估算器只依赖这个能力，测试时可以换成固定高度的假实现。

use anyhow::Result;
use tracing::debug;

use crate::error::ExportError;
use crate::infrastructure::js_executor::{JsExecutor, A4_WIDTH_PX};

/// 读取文档总高度的脚本
const MEASURE_HEIGHT_JS: &str = r#"(() => {
  const body = document.body;
  const html = document.documentElement;
  if (!body || !html) { return 0; }
  return Math.max(body.scrollHeight, body.offsetHeight, html.clientHeight, html.scrollHeight, html.offsetHeight);
})()"#;

/// 测量视口高度，取小值避免 clientHeight 撑高结果
const MEASURE_VIEWPORT_HEIGHT_PX: i64 = 200;

/// 测量能力
#[allow(async_fn_in_trait)]
pub trait HeightMeasurer {
    /// 把 HTML 装载到渲染面上
    async fn load(&self, html: &str) -> Result<()>;

    /// 读取当前渲染高度（像素）
    async fn measure_height(&self) -> Result<f64>;
}

/// 基于无头浏览器页面的测量实现
pub struct BrowserMeasurer {
    executor: JsExecutor,
}

impl BrowserMeasurer {
    /// 接管一个专用页面，并把视口固定为 A4 宽度
    pub async fn new(executor: JsExecutor) -> Result<Self> {
        executor
            .set_viewport(A4_WIDTH_PX, MEASURE_VIEWPORT_HEIGHT_PX)
            .await?;
        Ok(Self { executor })
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    pub fn into_executor(self) -> JsExecutor {
        self.executor
    }
}

impl HeightMeasurer for BrowserMeasurer {
    async fn load(&self, html: &str) -> Result<()> {
        self.executor.set_content(html).await.map_err(|e| {
            ExportError::MeasurementFailed {
                reason: format!("装载预览失败: {}", e),
            }
        })?;
        debug!("预览 HTML 已装载 ({} 字节)", html.len());
        Ok(())
    }

    async fn measure_height(&self) -> Result<f64> {
        let height: f64 = self
            .executor
            .eval_as(MEASURE_HEIGHT_JS)
            .await
            .map_err(|e| ExportError::MeasurementFailed {
                reason: e.to_string(),
            })?;
        Ok(height)
    }
}
