//! Integration tests running full sessions against an in-process
//! lottery server over loopback TCP.

use bet_relay::{
    CancellationToken, Client, Session, SessionOutcome,
    bets::{Bet, BetBatcher, SourceError},
    codec::{self, BatchFrame, LENGTH_PREFIX_SIZE},
    errors::ErrorKind,
    session::{SessionEvent, SessionState},
};
use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    thread::{self, JoinHandle},
    time::Duration,
};

/// How the test server answers each batch.
#[derive(Clone, Copy)]
enum Behavior {
    /// Echo the last number, then send winners for every even number.
    Honest,
    /// Confirm with a number that was never sent.
    WrongConfirmation,
    /// Send 3 of the 4 confirmation bytes and hang up.
    Truncate,
    /// Read frames but never answer.
    Silent,
}

fn bets(n: u32) -> Vec<Bet> {
    (1..=n)
        .map(|i| Bet::new("Ana", "Li", (30_000_000 + i).to_string(), "1990-01-01", i))
        .collect()
}

fn source(bets: Vec<Bet>) -> impl Iterator<Item = Result<Bet, SourceError>> {
    bets.into_iter().map(Ok)
}

fn read_frame(stream: &mut TcpStream) -> Option<BatchFrame> {
    let mut len = [0; LENGTH_PREFIX_SIZE];
    stream.read_exact(&mut len).ok()?;
    let mut payload = vec![0; codec::decode_frame_length(&len).ok()? as usize];
    stream.read_exact(&mut payload).ok()?;
    codec::decode_batch(&payload).ok()
}

/// Spawn a single-connection server; the handle yields every frame it read.
fn spawn_server(behavior: Behavior) -> (String, JoinHandle<Vec<BatchFrame>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut frames = Vec::new();
        let mut winners = Vec::new();

        while let Some(frame) = read_frame(&mut stream) {
            let has_more = frame.has_more;
            let last = frame.bets.last().map_or(0, |bet| bet.number);
            winners.extend(
                frame
                    .bets
                    .iter()
                    .filter(|bet| bet.number % 2 == 0)
                    .map(|bet| bet.identifier.parse::<u32>().unwrap()),
            );
            frames.push(frame);

            match behavior {
                Behavior::Honest if has_more => {
                    stream.write_all(&codec::encode_confirmation(last)).unwrap();
                }
                Behavior::Honest => {
                    stream.write_all(&codec::encode_winners(&winners)).unwrap();
                }
                Behavior::WrongConfirmation => {
                    stream
                        .write_all(&codec::encode_confirmation(last + 1000))
                        .unwrap();
                }
                Behavior::Truncate => {
                    stream.write_all(&codec::encode_confirmation(last)[..3]).unwrap();
                    break;
                }
                Behavior::Silent => {}
            }
        }
        frames
    });
    (addr, handle)
}

#[test]
fn test_full_session_over_tcp() {
    let (addr, server) = spawn_server(Behavior::Honest);

    let client = Client::connect(&addr, 4, None).unwrap();
    let batcher = BetBatcher::new(source(bets(5)), 2);
    let mut events = Vec::new();
    let mut session = Session::new(
        client,
        batcher,
        |event: &SessionEvent| events.push(event.clone()),
        CancellationToken::new(),
    );

    let outcome = session.run().unwrap();
    assert_eq!(
        outcome,
        SessionOutcome::Done {
            winners: vec![30_000_002, 30_000_004]
        }
    );
    assert_eq!(session.state(), SessionState::Done);
    drop(session);

    let frames = server.join().unwrap();
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|frame| frame.agency == 4));
    let finals = frames.iter().filter(|frame| !frame.has_more).count();
    assert_eq!(finals, 1);
    assert!(!frames.last().unwrap().has_more);

    let confirmations: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::ConfirmationReceived { number } => Some(*number),
            _ => None,
        })
        .collect();
    assert_eq!(confirmations, vec![2, 4]);
}

#[test]
fn test_two_bet_final_batch_winners_in_order() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let frame = read_frame(&mut stream).unwrap();
        stream.write_all(&codec::encode_winners(&[111, 222])).unwrap();
        frame
    });

    let client = Client::connect(&addr, 1, None).unwrap();
    let batcher = BetBatcher::new(source(bets(2)), 10);
    let mut session = Session::new(
        client,
        batcher,
        |_: &SessionEvent| {},
        CancellationToken::new(),
    );

    assert_eq!(
        session.run().unwrap(),
        SessionOutcome::Done {
            winners: vec![111, 222]
        }
    );
    let frame = server.join().unwrap();
    assert_eq!(frame.bets.len(), 2);
    assert!(!frame.has_more);
}

#[test]
fn test_wrong_confirmation_is_a_protocol_error() {
    let (addr, server) = spawn_server(Behavior::WrongConfirmation);

    let client = Client::connect(&addr, 1, None).unwrap();
    let batcher = BetBatcher::new(source(bets(4)), 2);
    let mut session = Session::new(
        client,
        batcher,
        |_: &SessionEvent| {},
        CancellationToken::new(),
    );

    let err = session.run().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(err.to_string().contains("unexpected confirmation"));
    drop(session);

    // The batch was not re-sent
    assert_eq!(server.join().unwrap().len(), 1);
}

#[test]
fn test_truncated_confirmation_is_a_receive_error() {
    let (addr, server) = spawn_server(Behavior::Truncate);

    let client = Client::connect(&addr, 1, None).unwrap();
    let batcher = BetBatcher::new(source(bets(4)), 2);
    let mut session = Session::new(
        client,
        batcher,
        |_: &SessionEvent| {},
        CancellationToken::new(),
    );

    let err = session.run().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Receive);
    assert_eq!(session.state(), SessionState::Failed);
    server.join().unwrap();
}

#[test]
fn test_cancelled_session_sends_nothing() {
    let (addr, server) = spawn_server(Behavior::Honest);

    let token = CancellationToken::new();
    token.cancel();
    let client = Client::connect(&addr, 1, None).unwrap();
    let batcher = BetBatcher::new(source(bets(4)), 2);
    let mut session = Session::new(client, batcher, |_: &SessionEvent| {}, token);

    assert_eq!(session.run().unwrap(), SessionOutcome::Stopped);
    assert!(server.join().unwrap().is_empty());
}

#[test]
fn test_cancellation_between_batches() {
    let (addr, server) = spawn_server(Behavior::Honest);

    let token = CancellationToken::new();
    let trigger = token.clone();
    let client = Client::connect(&addr, 1, None).unwrap();
    let batcher = BetBatcher::new(source(bets(6)), 2);
    let mut session = Session::new(
        client,
        batcher,
        move |event: &SessionEvent| {
            if matches!(event, SessionEvent::ConfirmationReceived { .. }) {
                trigger.cancel();
            }
        },
        token,
    );

    assert_eq!(session.run().unwrap(), SessionOutcome::Stopped);
    assert_eq!(session.batches_sent(), 1);
    drop(session);

    let frames = server.join().unwrap();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].has_more);
}

#[test]
fn test_read_timeout_is_a_receive_error() {
    let (addr, server) = spawn_server(Behavior::Silent);

    let client = Client::connect(&addr, 1, Some(Duration::from_millis(200))).unwrap();
    let batcher = BetBatcher::new(source(bets(2)), 1);
    let mut session = Session::new(
        client,
        batcher,
        |_: &SessionEvent| {},
        CancellationToken::new(),
    );

    let err = session.run().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Receive);
    drop(session);
    assert_eq!(server.join().unwrap().len(), 1);
}

#[test]
fn test_connection_refused() {
    // Grab a free port, then release it so nothing is listening
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let err = Client::connect(&addr, 1, None).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains(&addr));
}
