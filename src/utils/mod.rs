pub mod logging;

pub use logging::{
    append_notice, init_log_file, log_documents_loaded, log_startup, print_final_stats,
    truncate_text,
};
