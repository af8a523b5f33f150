//! Process-wide single-flight guard for scrapes.
//!
//! Every trigger (HTTP, cron, startup) goes through the same [`ScrapeSlot`].
//! A trigger that finds the slot taken is rejected instead of queued, so at
//! most one browser session exists per process.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct ScrapeSlot {
    inner: Arc<Mutex<()>>,
}

/// Holds the slot until dropped, including during unwinding.
#[derive(Debug)]
pub struct ScrapeSlotGuard {
    _held: OwnedMutexGuard<()>,
}

impl ScrapeSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot, or returns `None` if a scrape is already running.
    #[must_use]
    pub fn try_acquire(&self) -> Option<ScrapeSlotGuard> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .ok()
            .map(|held| ScrapeSlotGuard { _held: held })
    }
}
