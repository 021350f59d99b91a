//! # Bet Relay
//!
//! A client for submitting lottery bets to a central server in bounded
//! batches over a single persistent TCP connection.
//!
//! ## Protocol
//!
//! Each batch travels as one length-prefixed frame. While more batches
//! follow, the server acknowledges each one by echoing the number of its
//! last bet. The final batch (`has_more == false`) is answered with the
//! list of winning identifiers for the agency instead.
//!
//! ## Core Modules
//!
//! - [`bets`]: Bet records, the CSV reader and the batcher
//! - [`net`]: Wire codec and the blocking transport client
//! - [`session`]: The batch loop, cancellation and progress events
//!
//! ## Example
//!
//! ```no_run
//! use bet_relay::{
//!     Client,
//!     bets::{BetBatcher, CsvBetReader},
//!     session::{CancellationToken, LogObserver, Session},
//! };
//! use std::{fs::File, io::BufReader};
//!
//! let file = BufReader::new(File::open("agency.csv")?);
//! let client = Client::connect("127.0.0.1:12345", 1, None)?;
//! let batcher = BetBatcher::new(CsvBetReader::new(file), 100);
//! let mut session = Session::new(client, batcher, LogObserver::new(1), CancellationToken::new());
//! session.run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Bet records and batch sources.
pub mod bets;

/// Networking components (codec, client, framing).
pub mod net;
pub use net::{
    client::{self, Client},
    codec,
    errors::{self, ClientError},
};

/// Session driver, cancellation and events.
pub mod session;
pub use session::{CancellationToken, Session, SessionOutcome};
