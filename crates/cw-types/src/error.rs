use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown cache index: {0}")]
    UnknownIndex(String),

    #[error("change event has neither an old nor a new side")]
    EmptyChange,
}
