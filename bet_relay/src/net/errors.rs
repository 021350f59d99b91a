//! Network error types for encoding, decoding and protocol operations.

use std::{fmt, io};

use thiserror::Error;

use crate::bets::SourceError;

/// Errors that can occur while encoding a bet or batch.
///
/// These indicate bad input rather than a network problem and must be
/// prevented upstream by bounding batch sizes and validating records.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum EncodingError {
    /// A length-prefixed string field doesn't fit its 1-byte prefix
    #[error("string field of {len} bytes exceeds maximum of {max}")]
    StringTooLong { len: usize, max: usize },

    /// Birth dates are fixed-width on the wire
    #[error("birth date {value:?} must be exactly {expected} bytes")]
    BirthDateWidth { value: String, expected: usize },

    /// Batch payload doesn't fit a single frame
    #[error("frame payload {actual} exceeds maximum {max}")]
    FrameTooLarge { actual: usize, max: usize },

    /// Batch count doesn't fit its 2-byte header field
    #[error("batch of {count} bets exceeds maximum of {max}")]
    TooManyBets { count: usize, max: usize },
}

/// Errors that can occur while decoding a server response or frame.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum DecodeError {
    /// Fewer bytes than the structure needs
    #[error("need {needed} bytes, got {actual}")]
    ShortBuffer { needed: usize, actual: usize },

    /// Bytes left over after a complete structure
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    /// A string field isn't valid UTF-8
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    /// The has-more flag must be 0 or 1
    #[error("invalid has-more flag {0}")]
    InvalidFlag(u8),
}

/// The peer answered with something that doesn't match what was sent.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum ProtocolError {
    #[error("unexpected confirmation: expected {expected}, received {received}")]
    UnexpectedConfirmation { expected: u32, received: u32 },
}

/// Errors surfaced by the transport client and the session driver.
///
/// None of these are retried. Cancellation isn't an error and never
/// shows up here.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Dialing the server failed; fatal for the run
    #[error("couldn't connect to {addr}: {source}")]
    Connection { addr: String, source: io::Error },

    /// Writing a frame failed part-way
    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    /// The stream failed or ended before a full response arrived
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    /// Shutting the connection down failed
    #[error("close failed: {0}")]
    Close(#[source] io::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The batch source couldn't produce the next batch
    #[error("couldn't read bets: {0}")]
    Source(#[from] SourceError),

    /// The connection was already closed
    #[error("connection closed")]
    Closed,
}

/// Fieldless category of a [`ClientError`], used in session events.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    Connection,
    Send,
    Receive,
    Close,
    Encoding,
    Protocol,
    Decode,
    Source,
    Closed,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Send(_) => ErrorKind::Send,
            Self::Receive(_) => ErrorKind::Receive,
            Self::Close(_) => ErrorKind::Close,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Source(_) => ErrorKind::Source,
            Self::Closed => ErrorKind::Closed,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Connection => "connection",
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Close => "close",
            Self::Encoding => "encoding",
            Self::Protocol => "protocol",
            Self::Decode => "decode",
            Self::Source => "source",
            Self::Closed => "closed",
        };
        write!(f, "{repr}")
    }
}

/// Result type for transport and session operations
pub type Result<T> = std::result::Result<T, ClientError>;
