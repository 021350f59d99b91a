//! Session progress events and the observers that consume them.

use log::{error, info};
use std::fmt;

use crate::net::errors::ErrorKind;

/// Something noteworthy that happened during a session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEvent {
    /// A batch frame was fully written.
    BatchSent {
        count: usize,
        bytes: usize,
        has_more: bool,
    },
    /// The server acknowledged a batch.
    ConfirmationReceived { number: u32 },
    /// One winning identifier arrived.
    WinnerReceived { identifier: u32 },
    /// The whole winners list arrived.
    WinnersReceived { count: usize },
    /// Cancellation was observed and the session stopped cleanly.
    Stopped,
    /// The session aborted.
    Failed(ErrorKind),
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BatchSent {
                count,
                bytes,
                has_more,
            } => write!(
                f,
                "action: apuesta_enviada | result: success | cantidad: {count} | bytes: {bytes} | has_more: {has_more}"
            ),
            Self::ConfirmationReceived { number } => {
                write!(f, "action: receive_message | result: success | numero: {number}")
            }
            Self::WinnerReceived { identifier } => {
                write!(f, "action: ganador | result: success | dni: {identifier}")
            }
            Self::WinnersReceived { count } => {
                write!(f, "action: consulta_ganadores | result: success | cant_ganadores: {count}")
            }
            Self::Stopped => write!(f, "action: client_stop | result: success"),
            Self::Failed(kind) => write!(f, "action: session | result: fail | error: {kind}"),
        }
    }
}

/// Receives session events as they happen.
pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F: FnMut(&SessionEvent)> SessionObserver for F {
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

/// Writes each event as a status line through the `log` facade.
#[derive(Clone, Debug)]
pub struct LogObserver {
    pub client_id: u8,
}

impl LogObserver {
    pub fn new(client_id: u8) -> Self {
        Self { client_id }
    }
}

impl SessionObserver for LogObserver {
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Failed(_) => error!("{event} | client_id: {}", self.client_id),
            _ => info!("{event} | client_id: {}", self.client_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines() {
        let event = SessionEvent::WinnersReceived { count: 2 };
        assert_eq!(
            event.to_string(),
            "action: consulta_ganadores | result: success | cant_ganadores: 2"
        );
        assert_eq!(
            SessionEvent::Failed(ErrorKind::Receive).to_string(),
            "action: session | result: fail | error: receive"
        );
    }

    #[test]
    fn closures_are_observers() {
        let mut seen = Vec::new();
        {
            let mut observer = |event: &SessionEvent| seen.push(event.clone());
            observer.on_event(&SessionEvent::Stopped);
        }
        assert_eq!(seen, vec![SessionEvent::Stopped]);
    }

    #[test]
    fn log_observer_does_not_panic() {
        let mut observer = LogObserver::new(1);
        observer.on_event(&SessionEvent::ConfirmationReceived { number: 7 });
        observer.on_event(&SessionEvent::Failed(ErrorKind::Send));
    }
}
