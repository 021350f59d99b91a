//! Binary wire codec for bets, batches and server responses.
//!
//! Everything is big-endian. Frames carry a 2-byte length prefix that
//! counts only the payload after it:
//!
//! ```text
//! Frame        := length:u16 payload
//! BatchPayload := agency:u8 has_more:u8 count:u16 Bet*count
//! Bet          := name:LString surname:LString identifier:LString birth:[u8; 10] number:u32
//! LString      := len:u8 bytes[len]
//! Confirmation := number:u32
//! Winners      := count:u16 identifier:u32*count
//! ```
//!
//! Nothing in here performs I/O.

use super::errors::{DecodeError, EncodingError};
use crate::bets::{BIRTH_DATE_LEN, Bet};

/// Maximum payload size of a single frame, excluding the length prefix.
pub const MAX_FRAME_SIZE: usize = 512;

/// Size of the frame length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Size of `agency`, `has_more` and `count` at the start of a batch payload.
pub const BATCH_HEADER_SIZE: usize = 4;

/// Longest string a 1-byte length prefix can describe.
pub const MAX_STRING_LEN: usize = u8::MAX as usize;

pub const NUMBER_SIZE: usize = 4;
pub const IDENTIFIER_SIZE: usize = 4;
pub const WINNERS_HEADER_SIZE: usize = 2;

/// A decoded batch payload, as the server sees it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchFrame {
    pub agency: u8,
    pub has_more: bool,
    pub bets: Vec<Bet>,
}

fn put_string(buf: &mut Vec<u8>, s: &str) -> Result<(), EncodingError> {
    let bytes = s.as_bytes();
    if bytes.len() > MAX_STRING_LEN {
        return Err(EncodingError::StringTooLong {
            len: bytes.len(),
            max: MAX_STRING_LEN,
        });
    }
    buf.push(bytes.len() as u8);
    buf.extend_from_slice(bytes);
    Ok(())
}

fn put_bet(buf: &mut Vec<u8>, bet: &Bet) -> Result<(), EncodingError> {
    put_string(buf, &bet.name)?;
    put_string(buf, &bet.surname)?;
    put_string(buf, &bet.identifier)?;
    if bet.birth_date.len() != BIRTH_DATE_LEN {
        return Err(EncodingError::BirthDateWidth {
            value: bet.birth_date.clone(),
            expected: BIRTH_DATE_LEN,
        });
    }
    buf.extend_from_slice(bet.birth_date.as_bytes());
    buf.extend_from_slice(&bet.number.to_be_bytes());
    Ok(())
}

/// Prepend the 2-byte length prefix to a finished payload.
fn prefixed(payload: Vec<u8>) -> Result<Vec<u8>, EncodingError> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(EncodingError::FrameTooLarge {
            actual: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend(payload);
    Ok(frame)
}

/// Encode a string as `[len: u8][bytes]`.
pub fn encode_string(s: &str) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::with_capacity(1 + s.len());
    put_string(&mut buf, s)?;
    Ok(buf)
}

/// Encode a bet without any length prefix.
pub fn encode_bet(bet: &Bet) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::with_capacity(encoded_bet_len(bet));
    put_bet(&mut buf, bet)?;
    Ok(buf)
}

/// Number of bytes [`encode_bet`] produces for a well-formed bet.
pub fn encoded_bet_len(bet: &Bet) -> usize {
    3 + bet.name.len() + bet.surname.len() + bet.identifier.len() + BIRTH_DATE_LEN + NUMBER_SIZE
}

/// Encode a single bet as its own length-prefixed frame.
pub fn encode_bet_frame(bet: &Bet) -> Result<Vec<u8>, EncodingError> {
    prefixed(encode_bet(bet)?)
}

/// Encode a batch of bets as one length-prefixed frame.
///
/// # Errors
///
/// Fails if any bet can't be encoded, if there are more bets than the
/// count field holds, or if the payload exceeds [`MAX_FRAME_SIZE`].
pub fn encode_batch(bets: &[Bet], agency: u8, has_more: bool) -> Result<Vec<u8>, EncodingError> {
    let count = u16::try_from(bets.len()).map_err(|_| EncodingError::TooManyBets {
        count: bets.len(),
        max: u16::MAX as usize,
    })?;

    let mut payload = Vec::with_capacity(MAX_FRAME_SIZE);
    payload.push(agency);
    payload.push(u8::from(has_more));
    payload.extend_from_slice(&count.to_be_bytes());
    for bet in bets {
        put_bet(&mut payload, bet)?;
    }
    prefixed(payload)
}

/// Server-side encoding of a confirmation message.
pub fn encode_confirmation(number: u32) -> [u8; NUMBER_SIZE] {
    number.to_be_bytes()
}

/// Server-side encoding of a winners message.
pub fn encode_winners(identifiers: &[u32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(WINNERS_HEADER_SIZE + identifiers.len() * IDENTIFIER_SIZE);
    buf.extend_from_slice(&(identifiers.len() as u16).to_be_bytes());
    for id in identifiers {
        buf.extend_from_slice(&id.to_be_bytes());
    }
    buf
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], DecodeError> {
    bytes
        .get(..N)
        .and_then(|head| <[u8; N]>::try_from(head).ok())
        .ok_or(DecodeError::ShortBuffer {
            needed: N,
            actual: bytes.len(),
        })
}

/// Decode the 4-byte confirmation number.
pub fn decode_confirmation(bytes: &[u8]) -> Result<u32, DecodeError> {
    fixed::<NUMBER_SIZE>(bytes).map(u32::from_be_bytes)
}

/// Decode the count of identifiers that follow in a winners message.
pub fn decode_winners_header(bytes: &[u8]) -> Result<u16, DecodeError> {
    fixed::<WINNERS_HEADER_SIZE>(bytes).map(u16::from_be_bytes)
}

/// Decode a single 4-byte winning identifier.
pub fn decode_identifier(bytes: &[u8]) -> Result<u32, DecodeError> {
    fixed::<IDENTIFIER_SIZE>(bytes).map(u32::from_be_bytes)
}

/// Decode a frame's length prefix.
pub fn decode_frame_length(bytes: &[u8]) -> Result<u16, DecodeError> {
    fixed::<LENGTH_PREFIX_SIZE>(bytes).map(u16::from_be_bytes)
}

/// Forward-only view over a byte slice.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let buf: &'a [u8] = self.buf;
        let rest = &buf[self.pos..];
        if rest.len() < n {
            return Err(DecodeError::ShortBuffer {
                needed: n,
                actual: rest.len(),
            });
        }
        self.pos += n;
        Ok(&rest[..n])
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn text(&mut self, n: usize) -> Result<String, DecodeError> {
        let bytes = self.take(n)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    fn lstring(&mut self) -> Result<String, DecodeError> {
        let len = self.u8()? as usize;
        self.text(len)
    }

    fn bet(&mut self) -> Result<Bet, DecodeError> {
        let name = self.lstring()?;
        let surname = self.lstring()?;
        let identifier = self.lstring()?;
        let birth_date = self.text(BIRTH_DATE_LEN)?;
        let number = decode_confirmation(self.take(NUMBER_SIZE)?)?;
        Ok(Bet {
            name,
            surname,
            identifier,
            birth_date,
            number,
        })
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Decode one bet from the start of `bytes`, returning it with the
/// number of bytes consumed.
pub fn decode_bet(bytes: &[u8]) -> Result<(Bet, usize), DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let bet = cursor.bet()?;
    Ok((bet, cursor.pos))
}

/// Decode a batch payload (everything after the length prefix).
pub fn decode_batch(payload: &[u8]) -> Result<BatchFrame, DecodeError> {
    let mut cursor = Cursor::new(payload);
    let agency = cursor.u8()?;
    let has_more = match cursor.u8()? {
        0 => false,
        1 => true,
        flag => return Err(DecodeError::InvalidFlag(flag)),
    };
    let count = decode_winners_header(cursor.take(2)?)?;
    let bets = (0..count)
        .map(|_| cursor.bet())
        .collect::<Result<Vec<_>, _>>()?;
    match cursor.remaining() {
        0 => Ok(BatchFrame {
            agency,
            has_more,
            bets,
        }),
        n => Err(DecodeError::TrailingBytes(n)),
    }
}
