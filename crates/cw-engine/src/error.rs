use std::path::PathBuf;

use cw_cache::CacheError;
use thiserror::Error;

/// Errors that abort an engine command.
///
/// Anything below the command level (a bad entry, a failing listener) is
/// recovered and logged instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("setup failed: {0}")]
    Setup(String),

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

pub type EngineResult<T> = Result<T, EngineError>;
