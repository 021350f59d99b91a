//! The session driver: feeds batches to the client until the source runs
//! dry, the server sends the winners, or cancellation is requested.

use log::{debug, warn};
use std::fmt;

use super::{
    cancel::CancellationToken,
    events::{SessionEvent, SessionObserver},
};
use crate::{
    bets::{Batch, BatchSource, SourceError},
    net::{
        client::{Client, Connection},
        errors::{ClientError, Result},
    },
};

/// Where the session currently is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    Running,
    Sending,
    AwaitingResponse,
    Done,
    Stopped,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Running => "running",
            Self::Sending => "sending",
            Self::AwaitingResponse => "awaiting response",
            Self::Done => "done",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        write!(f, "{repr}")
    }
}

/// How a session that didn't fail ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionOutcome {
    /// Every batch went out; holds the winners in the order received.
    Done { winners: Vec<u32> },
    /// Cancellation was observed before the next batch.
    Stopped,
}

/// Drives one client run over a single connection.
pub struct Session<S: Connection, B, O> {
    client: Client<S>,
    source: B,
    observer: O,
    token: CancellationToken,
    state: SessionState,
    batches_sent: usize,
}

impl<S, B, O> Session<S, B, O>
where
    S: Connection,
    B: BatchSource,
    O: SessionObserver,
{
    pub fn new(client: Client<S>, source: B, observer: O, token: CancellationToken) -> Self {
        Self {
            client,
            source,
            observer,
            token,
            state: SessionState::Running,
            batches_sent: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn batches_sent(&self) -> usize {
        self.batches_sent
    }

    /// Run the session to completion.
    ///
    /// A batch is never re-sent, even when reading its response fails.
    ///
    /// # Errors
    ///
    /// Any send, receive, encoding, protocol, decode or source failure
    /// aborts the session and is returned as is.
    pub fn run(&mut self) -> Result<SessionOutcome> {
        while !self.state.is_terminal() {
            if self.token.is_cancelled() {
                self.stop();
                return Ok(SessionOutcome::Stopped);
            }
            self.state = SessionState::Running;

            let batch = match self.source.next_batch() {
                Ok(Some(batch)) => batch,
                Ok(None) if self.batches_sent > 0 => {
                    warn!("bet source ran out before a final batch was sent");
                    return Err(self.fail(SourceError::Unterminated.into()));
                }
                Ok(None) => {
                    self.close()?;
                    self.state = SessionState::Done;
                    return Ok(SessionOutcome::Done { winners: vec![] });
                }
                Err(error) => return Err(self.fail(error.into())),
            };

            if let Some(winners) = self.step(&batch)? {
                self.close()?;
                self.state = SessionState::Done;
                return Ok(SessionOutcome::Done { winners });
            }
        }
        Err(ClientError::Closed)
    }

    /// Send one batch and wait for its response. Returns the winners once
    /// the final batch has been answered.
    fn step(&mut self, batch: &Batch) -> Result<Option<Vec<u32>>> {
        let expected = match (batch.has_more, batch.last_number()) {
            (true, None) => {
                debug!("skipping empty intermediate batch");
                return Ok(None);
            }
            (true, Some(number)) => Some(number),
            (false, _) => None,
        };

        self.state = SessionState::Sending;
        let bytes = match self.client.send_batch(&batch.bets, batch.has_more) {
            Ok(bytes) => bytes,
            Err(error) => return Err(self.fail(error)),
        };
        self.batches_sent += 1;
        self.observer.on_event(&SessionEvent::BatchSent {
            count: batch.len(),
            bytes,
            has_more: batch.has_more,
        });

        self.state = SessionState::AwaitingResponse;
        match expected {
            Some(number) => match self.client.receive_confirmation(number) {
                Ok(number) => {
                    self.observer
                        .on_event(&SessionEvent::ConfirmationReceived { number });
                    Ok(None)
                }
                Err(error) => Err(self.fail(error)),
            },
            None => {
                let observer = &mut self.observer;
                let received = self.client.receive_winners(|identifier| {
                    observer.on_event(&SessionEvent::WinnerReceived { identifier })
                });
                match received {
                    Ok(winners) => {
                        self.observer.on_event(&SessionEvent::WinnersReceived {
                            count: winners.len(),
                        });
                        Ok(Some(winners))
                    }
                    Err(error) => Err(self.fail(error)),
                }
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if !self.client.is_open() {
            return Ok(());
        }
        self.client.close().map_err(|error| self.fail(error))
    }

    fn stop(&mut self) {
        if self.client.is_open() {
            if let Err(error) = self.client.close() {
                debug!("error closing connection on stop: {error}");
            }
        }
        self.state = SessionState::Stopped;
        self.observer.on_event(&SessionEvent::Stopped);
    }

    fn fail(&mut self, error: ClientError) -> ClientError {
        self.state = SessionState::Failed;
        self.observer.on_event(&SessionEvent::Failed(error.kind()));
        error
    }
}
