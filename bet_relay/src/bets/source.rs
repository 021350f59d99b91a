//! Bet record readers and the batcher that groups them into frames.

use log::debug;
use std::io::BufRead;

use super::{
    entities::{Batch, Bet},
    errors::SourceError,
};
use crate::net::codec::{BATCH_HEADER_SIZE, MAX_FRAME_SIZE, encoded_bet_len};

/// Number of comma-separated columns in a bet record.
pub const RECORD_FIELDS: usize = 5;

/// Supplies bounded batches of bets for a session.
pub trait BatchSource {
    /// The next batch, or `None` once the source is exhausted.
    ///
    /// The last batch returned is the only one with `has_more == false`.
    fn next_batch(&mut self) -> Result<Option<Batch>, SourceError>;
}

/// Reads `name,surname,identifier,birth_date,number` records, one per line.
///
/// Quoted fields aren't supported; blank lines are skipped. Unlike a
/// general CSV parser, surrounding whitespace is trimmed from every field,
/// so a field can't begin or end with a space.
///
/// Every record is checked against what the wire can carry (field widths
/// and the `YYYY-MM-DD` birth date), so bad input is reported here with its
/// line rather than when its batch is encoded.
pub struct CsvBetReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> CsvBetReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    fn parse(&self, record: &str) -> Result<Bet, SourceError> {
        let malformed = |reason: String| SourceError::Malformed {
            line: self.line,
            reason,
        };

        let fields: Vec<&str> = record.split(',').map(str::trim).collect();
        let [name, surname, identifier, birth_date, number] = fields[..] else {
            return Err(malformed(format!(
                "expected {RECORD_FIELDS} fields, found {}",
                fields.len()
            )));
        };

        // Identifiers travel as text but must fit in 32 bits
        let identifier = identifier
            .parse::<u32>()
            .map_err(|e| malformed(format!("identifier {identifier:?}: {e}")))?;
        let number = number
            .parse::<u32>()
            .map_err(|e| malformed(format!("number {number:?}: {e}")))?;

        let bet = Bet::new(name, surname, identifier.to_string(), birth_date, number);
        bet.validate().map_err(|e| malformed(e.to_string()))?;
        Ok(bet)
    }
}

impl<R: BufRead> Iterator for CsvBetReader<R> {
    type Item = Result<Bet, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let record = self.buf.trim();
                    if record.is_empty() {
                        continue;
                    }
                    return Some(self.parse(record));
                }
                Err(error) => return Some(Err(error.into())),
            }
        }
    }
}

/// Groups bets into batches bounded both by count and by frame size.
///
/// One bet of lookahead lets the batcher know which batch is the last,
/// so `has_more` is `false` on exactly one batch.
pub struct BetBatcher<I> {
    bets: I,
    max_count: usize,
    pending: Option<Bet>,
    exhausted: bool,
}

impl<I> BetBatcher<I>
where
    I: Iterator<Item = Result<Bet, SourceError>>,
{
    /// `max_count` is clamped to at least one bet per batch.
    pub fn new(bets: I, max_count: usize) -> Self {
        Self {
            bets,
            max_count: max_count.max(1),
            pending: None,
            exhausted: false,
        }
    }

    fn pull(&mut self) -> Result<Option<Bet>, SourceError> {
        if let Some(bet) = self.pending.take() {
            return Ok(Some(bet));
        }
        if self.exhausted {
            return Ok(None);
        }
        match self.bets.next().transpose()? {
            Some(bet) => Ok(Some(bet)),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

impl<I> BatchSource for BetBatcher<I>
where
    I: Iterator<Item = Result<Bet, SourceError>>,
{
    fn next_batch(&mut self) -> Result<Option<Batch>, SourceError> {
        let mut bets = Vec::new();
        let mut size = BATCH_HEADER_SIZE;

        while bets.len() < self.max_count {
            let Some(bet) = self.pull()? else {
                break;
            };
            let bet_size = encoded_bet_len(&bet);
            // An oversized lone bet still goes out so the encoder reports it
            if !bets.is_empty() && size + bet_size > MAX_FRAME_SIZE {
                debug!("frame budget reached after {} bets", bets.len());
                self.pending = Some(bet);
                break;
            }
            size += bet_size;
            bets.push(bet);
        }

        if bets.is_empty() {
            return Ok(None);
        }
        let has_more = match self.pull()? {
            Some(next) => {
                self.pending = Some(next);
                true
            }
            None => false,
        };
        Ok(Some(Batch::new(bets, has_more)))
    }
}

/// Wrap a fixed list of bets for [`BetBatcher`].
pub fn from_bets(bets: Vec<Bet>) -> impl Iterator<Item = Result<Bet, SourceError>> {
    bets.into_iter().map(Ok)
}
