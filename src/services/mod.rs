pub mod download;
pub mod llm_service;
pub mod measurer;
pub mod pagination;
pub mod printer;

pub use download::{save_artifact, slugify_title, DownloadArtifact};
pub use llm_service::{AnalysisOptions, LlmService};
pub use measurer::{BrowserMeasurer, HeightMeasurer};
pub use pagination::{render_preview, Pagination, PaginationEstimator, PreviewTracker, PAGE_HEIGHT_PX};
pub use printer::{await_typeset, BrowserPrintTarget, PrintContext, PrintTarget, TypesetOutcome};
