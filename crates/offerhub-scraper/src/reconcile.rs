use offerhub_core::OfferStore;
use serde::Serialize;

use crate::error::ReconcileError;
use crate::types::ScrapeResult;

/// What a reconcile pass did to storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub inserted: u64,
    pub updated: u64,
    /// `true` when the result held no offers and storage was not touched.
    pub skipped_empty: bool,
}

/// Writes a scrape result into `store` as one atomic upsert.
///
/// An empty result never reaches storage: a scrape that found nothing must
/// not be mistaken for "every offer disappeared". Offers already stored but
/// absent from `result` are left as they are.
///
/// # Errors
///
/// - [`ReconcileError::Unreachable`] if the store does not answer a ping.
/// - [`ReconcileError::Storage`] if the upsert fails; nothing is written.
pub async fn reconcile<S: OfferStore>(
    store: &S,
    result: &ScrapeResult,
) -> Result<ReconcileOutcome, ReconcileError> {
    if result.is_empty() {
        tracing::warn!(
            raw_cards = result.raw_cards,
            skipped = result.skipped,
            "scrape produced no offers; leaving stored offers unchanged"
        );
        return Ok(ReconcileOutcome {
            skipped_empty: true,
            ..ReconcileOutcome::default()
        });
    }

    store
        .ping()
        .await
        .map_err(|e| ReconcileError::Unreachable(Box::new(e)))?;

    let counts = store
        .upsert_many(&result.offers)
        .await
        .map_err(|e| ReconcileError::Storage(Box::new(e)))?;

    tracing::info!(
        inserted = counts.inserted,
        updated = counts.updated,
        "offers reconciled"
    );

    Ok(ReconcileOutcome {
        inserted: counts.inserted,
        updated: counts.updated,
        skipped_empty: false,
    })
}
