use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a browser-session capability.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open browser session: {0}")]
    Connect(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser command failed: {0}")]
    Command(String),

    #[error("{step} timed out after {timeout_ms}ms")]
    Timeout { step: &'static str, timeout_ms: u64 },
}

impl SessionError {
    pub(crate) fn timeout(step: &'static str, after: Duration) -> Self {
        Self::Timeout {
            step,
            timeout_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Fatal outcome of a scrape. Per-card problems never surface here; they are
/// counted as skips in the result.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("navigation failed: {0}")]
    NavigationFailed(#[source] SessionError),

    #[error("incremental load aborted after {rounds} rounds: {source}")]
    LoadAborted {
        rounds: u32,
        #[source]
        source: SessionError,
    },
}

/// Failure writing a scrape result to storage. Nothing is written when this
/// is returned.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("offer storage unreachable: {0}")]
    Unreachable(#[source] BoxError),

    #[error("offer storage write failed: {0}")]
    Storage(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
