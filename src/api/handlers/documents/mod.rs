pub mod ingest;
pub mod text;
pub mod types;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use ingest::upload_documents;
pub use text::get_text;
