//! Convergence-driven incremental loading.
//!
//! The listing page gives no total and no "last page" marker; it renders
//! more cards as the viewport moves down. Each probe round scrolls, waits
//! for the page to settle, and samples the number of matching cards. The
//! load is complete once the count has stayed flat for `stable_threshold`
//! consecutive rounds, or gives up (without error) after `max_rounds`.

use std::future::Future;
use std::time::Duration;

use crate::error::{ScrapeError, SessionError};
use crate::session::PageSession;
use crate::types::Convergence;

/// Tuning for [`load_all_cards`].
#[derive(Debug, Clone)]
pub struct LoadPolicy {
    /// CSS selector matching one merchant card.
    pub card_selector: String,
    pub scroll_delta_px: i64,
    /// Wait after each scroll before sampling.
    pub settle: Duration,
    /// Upper bound for each scroll and each sample.
    pub step_timeout: Duration,
    pub max_rounds: u32,
    pub stable_threshold: u32,
}

/// Cards visible when loading stopped, and why it stopped.
#[derive(Debug)]
pub struct LoadOutcome<C> {
    pub cards: Vec<C>,
    pub convergence: Convergence,
    pub rounds: u32,
}

/// Scrolls `session` until the card count converges or the round ceiling
/// is reached, then returns the last sampled cards.
///
/// The baseline before the first scroll is zero cards. A round whose count
/// differs from the previous sample in either direction resets the stable
/// counter; a shrinking count is a re-render and becomes the new baseline.
///
/// # Errors
///
/// Returns [`ScrapeError::LoadAborted`] when a scroll or sample fails or
/// exceeds `policy.step_timeout`.
pub async fn load_all_cards<P: PageSession>(
    session: &P,
    policy: &LoadPolicy,
) -> Result<LoadOutcome<P::Card>, ScrapeError> {
    let mut previous = 0usize;
    let mut stable_rounds = 0u32;
    let mut cards = Vec::new();

    for round in 1..=policy.max_rounds {
        let abort = |source| ScrapeError::LoadAborted {
            rounds: round,
            source,
        };

        bounded(
            "scroll",
            policy.step_timeout,
            session.scroll(policy.scroll_delta_px),
        )
        .await
        .map_err(abort)?;

        if !policy.settle.is_zero() {
            tokio::time::sleep(policy.settle).await;
        }

        cards = bounded(
            "sample",
            policy.step_timeout,
            session.query_all(&policy.card_selector),
        )
        .await
        .map_err(abort)?;

        let count = cards.len();
        if count == previous {
            stable_rounds += 1;
        } else {
            stable_rounds = 0;
        }
        tracing::debug!(round, count, previous, stable_rounds, "probe round");
        previous = count;

        if stable_rounds >= policy.stable_threshold {
            return Ok(LoadOutcome {
                cards,
                convergence: Convergence::Converged,
                rounds: round,
            });
        }
    }

    Ok(LoadOutcome {
        cards,
        convergence: Convergence::ExhaustedAttempts,
        rounds: policy.max_rounds,
    })
}

async fn bounded<T>(
    step: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T, SessionError>>,
) -> Result<T, SessionError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::timeout(step, limit)),
    }
}
