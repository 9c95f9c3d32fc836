pub mod document;
pub mod loaders;
pub mod options;
pub mod settings;

pub use document::{clamp_difficulty, parse_keywords, Document, Exercise, ExerciseDraft};
pub use loaders::{load_documents_file, parse_import, save_documents_file};
pub use options::{Columns, ExportOptions, ExportTheme, FontSize};
pub use settings::{AppSettings, UiTheme};
