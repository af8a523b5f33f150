//! Per-card extraction.
//!
//! A card is read through three data attributes. Only the merchant name is
//! required; a card without one is skipped rather than failing the batch.

use std::time::Duration;

use offerhub_core::{Offer, NOT_AVAILABLE};

use crate::error::SessionError;
use crate::normalize::normalize_cashback;
use crate::retry::retry_with_backoff;
use crate::session::CardHandle;

pub(crate) const ATTR_NAME: &str = "data-merchant-name";
pub(crate) const ATTR_CASHBACK: &str = "data-max-cashback-rate";
pub(crate) const ATTR_LINK: &str = "data-feature-destination-url";

/// Result of extracting a single card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Offer(Offer),
    /// The card had no usable merchant name.
    Skipped,
}

/// Retry and time limits for attribute reads.
#[derive(Debug, Clone, Copy)]
pub struct ExtractPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    /// Upper bound for a single attribute read; each retry gets a fresh one.
    pub read_timeout: Duration,
}

impl Default for ExtractPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base: Duration::from_millis(250),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// Reads one card into an [`Offer`].
///
/// Attribute reads are retried per `policy`, and a read that outlives
/// `read_timeout` counts as a failed attempt. An error is returned only when
/// reads still fail after the retries; callers count that card as skipped.
///
/// # Errors
///
/// Returns the last [`SessionError`] from a failed attribute read.
pub async fn extract_offer<C: CardHandle>(
    card: &C,
    policy: ExtractPolicy,
) -> Result<Extraction, SessionError> {
    let name = read(card, ATTR_NAME, policy).await?;
    let Some(store) = non_blank(name) else {
        return Ok(Extraction::Skipped);
    };

    let cashback = read(card, ATTR_CASHBACK, policy).await?;
    let link = read(card, ATTR_LINK, policy).await?;

    Ok(Extraction::Offer(Offer {
        store,
        cashback: normalize_cashback(cashback.as_deref()),
        link: non_blank(link).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }))
}

async fn read<C: CardHandle>(
    card: &C,
    name: &str,
    policy: ExtractPolicy,
) -> Result<Option<String>, SessionError> {
    let limit = policy.read_timeout;
    retry_with_backoff(policy.max_retries, policy.backoff_base, move || async move {
        tokio::time::timeout(limit, card.attribute(name))
            .await
            .unwrap_or_else(|_| Err(SessionError::timeout("attribute read", limit)))
    })
    .await
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
