use std::path::PathBuf;

use cw_types::EntryIdentity;

/// Errors from cache provider operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The requested file does not exist in this cache.
    #[error("entry not found: {0}")]
    NotFound(EntryIdentity),

    /// The requested cache version could not be resolved.
    #[error("cache version '{version}' not found under {}", root.display())]
    VersionNotFound { root: PathBuf, version: String },

    /// The version identifier is not a single directory name.
    #[error("invalid cache version '{0}'")]
    InvalidVersion(String),

    /// Index metadata on disk could not be parsed.
    #[error("corrupt index metadata at {}: {reason}", path.display())]
    CorruptMetadata { path: PathBuf, reason: String },

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
