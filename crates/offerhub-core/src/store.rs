use std::future::Future;

use crate::offers::{Offer, OfferRecord, UpsertCounts};

/// Persistence capability for current-state offers, keyed by store.
///
/// Implementations must:
/// - enforce uniqueness on [`crate::offer_key`] of `store`,
/// - apply one `upsert_many` call atomically (all rows or none),
/// - stamp `scraped_at` at write time,
/// - leave rows whose key is absent from the batch untouched.
pub trait OfferStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Verifies the backend is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Inserts offers whose key is new and overwrites `cashback`, `link`,
    /// and `scraped_at` for keys that already exist.
    fn upsert_many(
        &self,
        offers: &[Offer],
    ) -> impl Future<Output = Result<UpsertCounts, Self::Error>> + Send;

    /// Returns every persisted offer ordered by store ascending.
    fn list_all(&self) -> impl Future<Output = Result<Vec<OfferRecord>, Self::Error>> + Send;
}
