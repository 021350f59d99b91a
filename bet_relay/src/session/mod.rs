//! Session driving: the batch loop, cancellation and progress events.

pub mod cancel;
pub mod driver;
pub mod events;

pub use cancel::CancellationToken;
pub use driver::{Session, SessionOutcome, SessionState};
pub use events::{LogObserver, SessionEvent, SessionObserver};
