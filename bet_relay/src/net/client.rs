//! A blocking TCP client that ships bet batches to the lottery server.
//!
//! One connection is kept open for the whole session and only one batch
//! is ever in flight: each frame is written in full, then its response
//! is read in full before anything else happens.

use log::{debug, info};
use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream},
    time::Duration,
};

use super::{
    codec::{self, IDENTIFIER_SIZE, NUMBER_SIZE, WINNERS_HEADER_SIZE},
    errors::{ClientError, ProtocolError, Result},
    utils,
};
use crate::bets::Bet;

/// A bidirectional byte stream the client can own.
pub trait Connection: Read + Write {
    /// Tear the stream down. Calling this twice isn't guaranteed to work.
    fn close(&mut self) -> io::Result<()>;
}

impl Connection for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

/// A blocking client bound to a single agency.
pub struct Client<S: Connection = TcpStream> {
    /// Agency id embedded in every batch.
    pub agency: u8,
    stream: Option<S>,
}

impl Client<TcpStream> {
    /// Connect to the lottery server.
    ///
    /// When `timeout` is set it bounds every individual read and write;
    /// otherwise socket operations block indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the server can't be reached.
    /// There is no retry.
    pub fn connect(addr: &str, agency: u8, timeout: Option<Duration>) -> Result<Self> {
        let connection_error = |source| ClientError::Connection {
            addr: addr.to_string(),
            source,
        };
        let stream = TcpStream::connect(addr).map_err(connection_error)?;
        stream.set_read_timeout(timeout).map_err(connection_error)?;
        stream.set_write_timeout(timeout).map_err(connection_error)?;
        info!("action: connect | result: success | client_id: {agency} | server: {addr}");
        Ok(Self::new(stream, agency))
    }
}

impl<S: Connection> Client<S> {
    /// Wrap an already open connection.
    pub fn new(stream: S, agency: u8) -> Self {
        Self {
            agency,
            stream: Some(stream),
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut S> {
        self.stream.as_mut().ok_or(ClientError::Closed)
    }

    /// Encode and write a batch, returning the number of bytes sent.
    ///
    /// # Errors
    ///
    /// Encoding failures are reported before anything is written. A
    /// stream failure part-way through the frame is a [`ClientError::Send`].
    pub fn send_batch(&mut self, bets: &[Bet], has_more: bool) -> Result<usize> {
        let frame = codec::encode_batch(bets, self.agency, has_more)?;
        let stream = self.stream()?;
        utils::write_frame(stream, &frame).map_err(ClientError::Send)?;
        debug!(
            "sent batch of {} bets ({} bytes, has_more: {has_more})",
            bets.len(),
            frame.len()
        );
        Ok(frame.len())
    }

    /// Read the server's confirmation and check it echoes `expected`,
    /// the number of the last bet in the batch just sent.
    pub fn receive_confirmation(&mut self, expected: u32) -> Result<u32> {
        let stream = self.stream()?;
        let buf = utils::read_array::<NUMBER_SIZE, _>(stream).map_err(ClientError::Receive)?;
        let received = codec::decode_confirmation(&buf)?;
        if received != expected {
            return Err(ProtocolError::UnexpectedConfirmation { expected, received }.into());
        }
        Ok(received)
    }

    /// Read the final winners list.
    ///
    /// `on_winner` sees each identifier as soon as it's decoded, before
    /// the rest of the list has arrived.
    pub fn receive_winners<F>(&mut self, mut on_winner: F) -> Result<Vec<u32>>
    where
        F: FnMut(u32),
    {
        let stream = self.stream()?;
        let header =
            utils::read_array::<WINNERS_HEADER_SIZE, _>(stream).map_err(ClientError::Receive)?;
        let count = codec::decode_winners_header(&header)?;

        let mut winners = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let buf =
                utils::read_array::<IDENTIFIER_SIZE, _>(stream).map_err(ClientError::Receive)?;
            let id = codec::decode_identifier(&buf)?;
            on_winner(id);
            winners.push(id);
        }
        Ok(winners)
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the connection was already closed.
    pub fn close(&mut self) -> Result<()> {
        let mut stream = self.stream.take().ok_or(ClientError::Closed)?;
        match stream.close() {
            Ok(()) => Ok(()),
            // The peer hanging up first still leaves us closed
            Err(error) if error.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(error) => Err(ClientError::Close(error)),
        }
    }
}
