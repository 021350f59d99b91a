use std::io;

use thiserror::Error;

/// A bet whose fields can't be put on the wire.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum BetError {
    /// Text fields travel behind a 1-byte length prefix
    #[error("{field} of {len} bytes exceeds maximum of {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("birth date {0:?} must be formatted as YYYY-MM-DD")]
    BirthDate(String),
}

/// Errors from reading bet records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("couldn't read records: {0}")]
    Io(#[from] io::Error),

    /// A record that doesn't have the expected shape
    #[error("malformed record on line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// The source stopped after a batch that promised more
    #[error("bet source ended before the final batch")]
    Unterminated,
}
