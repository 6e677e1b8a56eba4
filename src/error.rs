use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read page {page_index}: {reason}")]
    PageRead { page_index: usize, reason: String },

    #[error("unknown highlight condition: {0}")]
    UnknownCondition(i64),

    #[error("failed to open PDF {}: {reason}", path.display())]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("failed to draw on page {page_index}: {reason}")]
    Render { page_index: usize, reason: String },

    #[error("failed to save annotated PDF {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    #[error("PDFium library unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("invalid row pattern: {0}")]
    Pattern(#[from] regex::Error),
}
