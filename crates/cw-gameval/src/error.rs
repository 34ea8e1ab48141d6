use std::path::PathBuf;

use cw_cache::CacheError;
use thiserror::Error;

use crate::types::GameValType;

/// Errors from GameVal mapping and reporting.
#[derive(Debug, Error)]
pub enum GameValError {
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// A type yielded no usable names.
    #[error("gameval type {0} has no valid names")]
    NoNames(GameValType),

    #[error("unknown gameval type: {0}")]
    UnknownType(String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type GameValResult<T> = Result<T, GameValError>;
