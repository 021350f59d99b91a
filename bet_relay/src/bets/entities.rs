use std::fmt;

use super::errors::BetError;
use crate::net::codec::MAX_STRING_LEN;

/// Byte width of a birth date on the wire (`YYYY-MM-DD`).
pub const BIRTH_DATE_LEN: usize = 10;

/// A single lottery bet placed at an agency.
///
/// The identifier is kept in its decimal textual form because that is
/// how it travels on the wire. Record readers are responsible for
/// checking that it fits in 32 bits.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Bet {
    pub name: String,
    pub surname: String,
    pub identifier: String,
    pub birth_date: String,
    pub number: u32,
}

impl Bet {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        identifier: impl Into<String>,
        birth_date: impl Into<String>,
        number: u32,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            identifier: identifier.into(),
            birth_date: birth_date.into(),
            number,
        }
    }
}

/// Check that `value` is a `YYYY-MM-DD` date shape.
///
/// Only the layout is checked, not the calendar.
pub fn validate_birth_date(value: &str) -> Result<(), BetError> {
    let shaped = value.len() == BIRTH_DATE_LEN
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if shaped {
        Ok(())
    } else {
        Err(BetError::BirthDate(value.to_string()))
    }
}

impl Bet {
    /// Check every field against what the wire format can carry.
    pub fn validate(&self) -> Result<(), BetError> {
        for (field, value) in [
            ("name", &self.name),
            ("surname", &self.surname),
            ("identifier", &self.identifier),
        ] {
            if value.len() > MAX_STRING_LEN {
                return Err(BetError::FieldTooLong {
                    field,
                    len: value.len(),
                    max: MAX_STRING_LEN,
                });
            }
        }
        validate_birth_date(&self.birth_date)
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "dni: {} | numero: {}", self.identifier, self.number)
    }
}

/// A bounded group of bets sent to the server as one frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Batch {
    pub bets: Vec<Bet>,
    /// Whether further batches follow in this session.
    pub has_more: bool,
}

impl Batch {
    pub fn new(bets: Vec<Bet>, has_more: bool) -> Self {
        Self { bets, has_more }
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    /// The number the server echoes back when confirming this batch.
    pub fn last_number(&self) -> Option<u32> {
        self.bets.last().map(|bet| bet.number)
    }
}
