use std::time::Duration;

use thiserror::Error;

/// Failure of a single listener's handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("decode failed: {0}")]
    Decode(#[from] cw_decode::DecodeError),

    #[error("document builder failed: {0}")]
    Document(String),

    #[error("handler timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),
}

pub type HandlerResult = Result<(), HandlerError>;
