use cw_types::{ArchiveId, FileId, IndexType};

/// Errors raised while decoding an entry into a typed record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// No decoder is registered for the entry's archive.
    #[error("no decoder registered for {index}/{archive}")]
    NoDecoder { index: IndexType, archive: ArchiveId },

    /// The payload could not be decoded.
    #[error("malformed payload for file {file}: {reason}")]
    Malformed { file: FileId, reason: String },

    /// A record of one type was used where another was expected.
    #[error("expected a {expected} record, got {actual}")]
    UnexpectedRecord {
        expected: &'static str,
        actual: &'static str,
    },

    /// A database row belongs to a different table than the view requires.
    #[error("row {row} belongs to table {actual}, expected table {expected}")]
    WrongTable { row: u32, expected: u32, actual: u32 },

    /// A required database column is missing or has the wrong type.
    #[error("row {row} is missing column {column}")]
    MissingColumn { row: u32, column: u32 },
}

/// Convenience alias for decode results.
pub type DecodeResult<T> = Result<T, DecodeError>;
