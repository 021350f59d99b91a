//! Bet records and the sources that batch them for sending.

pub mod entities;
pub mod errors;
pub mod source;

pub use entities::{BIRTH_DATE_LEN, Batch, Bet, validate_birth_date};
pub use errors::{BetError, SourceError};
pub use source::{BatchSource, BetBatcher, CsvBetReader};
