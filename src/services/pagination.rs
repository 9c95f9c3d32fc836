//! 分页估算服务 - 业务能力层
//!
//! 只负责"量高度 → 算页数 → 给出分页标记"，不关心高度是怎么量出来的。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tokio::time::sleep;
use tracing::debug;

use crate::i18n::Translator;
use crate::services::measurer::HeightMeasurer;

/// 单页可打印高度（像素）
///
/// A4 高 29.7cm，上下边距各 2cm，剩 25.7cm；按 37.8px/cm 约为 971px，取整为 970。
/// 这是一个可调的近似值，需要和下游打印引擎保持一致。
pub const PAGE_HEIGHT_PX: f64 = 970.0;

/// 分页标记（仅用于预览）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageBreakMarker {
    /// 标记之后开始的页码（从 2 开始）
    pub page_number: usize,
    /// 距文档顶部的像素偏移
    pub top_px: f64,
}

/// 一次测量的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub rendered_height: f64,
    pub page_count: usize,
    pub markers: Vec<PageBreakMarker>,
}

impl Pagination {
    /// 根据渲染高度计算分页
    pub fn from_height(rendered_height: f64, page_height: f64) -> Self {
        let page_count = page_count(rendered_height, page_height);
        Self {
            rendered_height,
            page_count,
            markers: page_break_markers(page_count, page_height),
        }
    }
}

/// `ceil(height / page_height)`，至少 1 页
pub fn page_count(rendered_height: f64, page_height: f64) -> usize {
    if !rendered_height.is_finite() || rendered_height <= 0.0 || page_height <= 0.0 {
        return 1;
    }
    ((rendered_height / page_height).ceil() as usize).max(1)
}

/// N 页文档有 N-1 个标记，第 k 个位于 `k * page_height`
pub fn page_break_markers(page_count: usize, page_height: f64) -> Vec<PageBreakMarker> {
    (1..page_count)
        .map(|k| PageBreakMarker {
            page_number: k + 1,
            top_px: k as f64 * page_height,
        })
        .collect()
}

/// 分页估算器
///
/// 每次测量前先让出一次调度，再等待固定的稳定时间，让异步排版有机会完成。
pub struct PaginationEstimator<M> {
    measurer: M,
    page_height_px: f64,
    settle_delay: Duration,
}

impl<M: HeightMeasurer> PaginationEstimator<M> {
    pub fn new(measurer: M, page_height_px: f64, settle_delay: Duration) -> Self {
        Self {
            measurer,
            page_height_px,
            settle_delay,
        }
    }

    pub fn page_height_px(&self) -> f64 {
        self.page_height_px
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    pub fn into_measurer(self) -> M {
        self.measurer
    }

    /// 测量 HTML 并计算分页；输入不变时结果不变
    pub async fn estimate(&self, html: &str) -> Result<Pagination> {
        self.measurer.load(html).await?;

        tokio::task::yield_now().await;
        if !self.settle_delay.is_zero() {
            sleep(self.settle_delay).await;
        }

        let height = self.measurer.measure_height().await?;
        let pagination = Pagination::from_height(height, self.page_height_px);
        debug!(
            "渲染高度 {:.0}px → {} 页",
            pagination.rendered_height, pagination.page_count
        );
        Ok(pagination)
    }
}

/// 预览状态：只接受最新一次渲染的测量结果
///
/// 选项变化时会发起新的测量，旧的测量可能晚到，凭票号丢弃。
#[derive(Debug, Default)]
pub struct PreviewTracker {
    generation: AtomicU64,
    latest: Mutex<Option<Pagination>>,
}

impl PreviewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一次新的渲染，返回票号
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 提交测量结果；票号过期则丢弃并返回 false
    pub fn commit(&self, ticket: u64, pagination: Pagination) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        if ticket != self.generation.load(Ordering::SeqCst) {
            debug!("丢弃过期的测量结果 (票号 {})", ticket);
            return false;
        }
        *latest = Some(pagination);
        true
    }

    /// 当前页数，没有任何结果时为 1
    pub fn page_count(&self) -> usize {
        self.latest()
            .map(|p| p.page_count)
            .unwrap_or(1)
    }

    pub fn latest(&self) -> Option<Pagination> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// 在导出 HTML 上叠加分页标记，生成预览文件
///
/// 标记只出现在预览里，打印用的 HTML 不受影响。
pub fn render_preview(html: &str, pagination: &Pagination, translator: &Translator) -> String {
    if pagination.markers.is_empty() {
        return html.to_string();
    }

    let mut overlay = String::from(
        "<style>.page-break-marker{position:absolute;left:0;width:100%;display:flex;align-items:center;pointer-events:none;z-index:10}\
.page-break-marker::before,.page-break-marker::after{content:'';flex-grow:1;border-top:1px dashed #94a3b8}\
.page-break-marker span{font:600 11px sans-serif;color:#64748b;background:#e2e8f0;padding:2px 8px;border-radius:9999px;transform:translateY(-50%)}\
@media print{.page-break-marker{display:none}}</style>\n",
    );
    for marker in &pagination.markers {
        let page = marker.page_number.to_string();
        let label = translator.t_with("modals.export.pageBreak", &[("page", page.as_str())]);
        overlay.push_str(&format!(
            "<div class=\"page-break-marker\" style=\"top: {}px\"><span>{}</span></div>\n",
            marker.top_px, label
        ));
    }

    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + overlay.len() + 40);
            out.push_str(&html[..pos]);
            out.push_str("<div class=\"page-break-overlay\" style=\"position:absolute;top:0;left:0;width:100%\">\n");
            out.push_str(&overlay);
            out.push_str("</div>\n");
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{}{}", html, overlay),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use std::sync::atomic::AtomicUsize;

    struct FixedMeasurer {
        height: f64,
        loads: AtomicUsize,
    }

    impl HeightMeasurer for FixedMeasurer {
        async fn load(&self, _html: &str) -> Result<()> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn measure_height(&self) -> Result<f64> {
            Ok(self.height)
        }
    }

    #[test]
    fn page_count_boundaries() {
        for (height, expected) in [
            (500.0, 1),
            (970.0, 1),
            (971.0, 2),
            (1940.0, 2),
            (1941.0, 3),
        ] {
            assert_eq!(page_count(height, PAGE_HEIGHT_PX), expected, "H={}", height);
        }
    }

    #[test]
    fn page_count_is_at_least_one() {
        assert_eq!(page_count(0.0, PAGE_HEIGHT_PX), 1);
        assert_eq!(page_count(-5.0, PAGE_HEIGHT_PX), 1);
        assert_eq!(page_count(f64::NAN, PAGE_HEIGHT_PX), 1);
    }

    #[test]
    fn page_count_is_monotonic() {
        let mut previous = 0;
        for h in (0..10_000).step_by(37) {
            let count = page_count(h as f64, PAGE_HEIGHT_PX);
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn markers_sit_on_page_boundaries() {
        let markers = page_break_markers(3, PAGE_HEIGHT_PX);
        assert_eq!(
            markers,
            vec![
                PageBreakMarker { page_number: 2, top_px: 970.0 },
                PageBreakMarker { page_number: 3, top_px: 1940.0 },
            ]
        );
        assert!(page_break_markers(1, PAGE_HEIGHT_PX).is_empty());
    }

    #[tokio::test]
    async fn estimate_is_idempotent() {
        let estimator = PaginationEstimator::new(
            FixedMeasurer { height: 2500.0, loads: AtomicUsize::new(0) },
            PAGE_HEIGHT_PX,
            Duration::from_millis(1),
        );
        let first = estimator.estimate("<html></html>").await.unwrap();
        let second = estimator.estimate("<html></html>").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.markers.len(), 2);
        assert_eq!(estimator.measurer().loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn tracker_discards_stale_results() {
        let tracker = PreviewTracker::new();
        assert_eq!(tracker.page_count(), 1);

        let stale = tracker.begin();
        let fresh = tracker.begin();
        assert!(tracker.commit(fresh, Pagination::from_height(2000.0, PAGE_HEIGHT_PX)));
        assert!(!tracker.commit(stale, Pagination::from_height(100.0, PAGE_HEIGHT_PX)));
        assert_eq!(tracker.page_count(), 3);
    }

    #[test]
    fn preview_overlay_labels_each_break() {
        let html = "<html><body><p>x</p></body></html>";
        let pagination = Pagination::from_height(2000.0, PAGE_HEIGHT_PX);
        let preview = render_preview(html, &pagination, &Translator::new(Language::En));
        assert!(preview.contains("top: 970px"));
        assert!(preview.contains("top: 1940px"));
        assert!(preview.contains("<span>Page 2</span>"));
        assert!(preview.contains("<span>Page 3</span>"));
        assert!(preview.ends_with("</body></html>"));

        let single = Pagination::from_height(100.0, PAGE_HEIGHT_PX);
        assert_eq!(render_preview(html, &single, &Translator::new(Language::En)), html);
    }
}
