use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing a derived page.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid page location {section}/{slug}")]
    InvalidLocation { section: String, slug: String },

    #[error("failed to write page {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type DocumentResult<T> = Result<T, DocumentError>;
