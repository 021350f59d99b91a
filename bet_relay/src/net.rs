//! Networking layer for client-server communication.
//!
//! This module provides a blocking TCP client speaking the lottery's
//! length-prefixed, big-endian binary protocol.

/// Blocking TCP client for shipping bet batches.
pub mod client;

/// Encoders and decoders for frames and server responses.
pub mod codec;

/// Error types for the transport and the codec.
pub mod errors;

/// Utilities for writing and reading whole frames over partial I/O.
pub mod utils;
