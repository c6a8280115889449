use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Marks which session run a pending result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

/// Stale-response guard
///
/// Long-running requests capture an [`Epoch`] before they start and check it
/// before applying their result. Tearing a session down advances the epoch,
/// so anything still in flight is discarded when it lands.
#[derive(Debug, Clone, Default)]
pub struct SessionGuard {
    epoch: Arc<AtomicU64>,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Epoch {
        Epoch(self.epoch.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current() == epoch
    }

    /// Invalidate everything captured so far
    pub fn advance(&self) -> Epoch {
        Epoch(self.epoch.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
