use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable shutdown request flag.
///
/// The only state a signal handler may touch: the handler body sets the
/// flag and nothing else. All real handling (teardown, logging, control
/// flow) happens in the loops that poll it.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag {
    inner: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Safe to call from a signal handler.
    pub fn request(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested.
    pub fn is_set(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}
