use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// A cloneable stop flag shared between a signal handler and the session.
///
/// The session only looks at it between batches, never mid-frame.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
