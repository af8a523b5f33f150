use offerhub_core::{Offer, OfferRecord, OfferStore, UpsertCounts};
use sqlx::PgPool;

use crate::offers::{list_offers, upsert_offers};
use crate::DbError;

/// [`OfferStore`] backed by the `offers` table.
#[derive(Debug, Clone)]
pub struct PgOfferStore {
    pool: PgPool,
}

impl PgOfferStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl OfferStore for PgOfferStore {
    type Error = DbError;

    async fn ping(&self) -> Result<(), DbError> {
        crate::health_check(&self.pool).await
    }

    async fn upsert_many(&self, offers: &[Offer]) -> Result<UpsertCounts, DbError> {
        upsert_offers(&self.pool, offers).await
    }

    async fn list_all(&self) -> Result<Vec<OfferRecord>, DbError> {
        let rows = list_offers(&self.pool).await?;
        Ok(rows.into_iter().map(OfferRecord::from).collect())
    }
}
