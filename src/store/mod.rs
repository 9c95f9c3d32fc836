pub mod document_store;

pub use document_store::{generate_id, DocumentPatch, DocumentStore};
