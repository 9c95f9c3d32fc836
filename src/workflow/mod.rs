pub mod export_ctx;
pub mod export_flow;
pub mod notice;
pub mod print_flow;

pub use export_ctx::ExportCtx;
pub use export_flow::{ExportFlow, ExportReport};
pub use notice::{Notice, NoticeLevel};
pub use print_flow::{PrintAborted, PrintFlow, PrintReport, PrintState};
