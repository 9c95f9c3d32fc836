pub mod document_loader;

pub use document_loader::{
    load_documents_file, parse_import, parse_toml_documents, save_documents_file,
};
