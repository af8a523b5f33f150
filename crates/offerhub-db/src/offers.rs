//! Database operations for the `offers` table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use offerhub_core::{Offer, OfferRecord, UpsertCounts};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `offers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    pub id: i64,
    pub store: String,
    pub cashback: String,
    pub link: String,
    pub scraped_at: DateTime<Utc>,
}

impl From<OfferRow> for OfferRecord {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.id,
            store: row.store,
            cashback: row.cashback,
            link: row.link,
            scraped_at: row.scraped_at,
        }
    }
}

/// Inserts offers with a new store key and overwrites `cashback`, `link`
/// and `scraped_at` for keys already present.
///
/// The batch is deduplicated by [`offerhub_core::offer_key`] first (last
/// entry wins) because one `ON CONFLICT` statement cannot touch the same row
/// twice. The whole batch goes through one `INSERT … SELECT * FROM UNNEST(…)`
/// inside a transaction, so either every row is written or none is. The
/// display name of an existing row is kept.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction or the upsert fails.
pub async fn upsert_offers(pool: &PgPool, offers: &[Offer]) -> Result<UpsertCounts, DbError> {
    if offers.is_empty() {
        return Ok(UpsertCounts::default());
    }

    let mut by_key: BTreeMap<String, &Offer> = BTreeMap::new();
    for offer in offers {
        by_key.insert(offer.key(), offer);
    }

    // Parallel column vectors for UNNEST binding.
    let mut stores: Vec<String> = Vec::with_capacity(by_key.len());
    let mut cashbacks: Vec<String> = Vec::with_capacity(by_key.len());
    let mut links: Vec<String> = Vec::with_capacity(by_key.len());
    for offer in by_key.values() {
        stores.push(offer.store.trim().to_string());
        cashbacks.push(offer.cashback.clone());
        links.push(offer.link.clone());
    }

    let mut tx = pool.begin().await?;

    let rows: Vec<bool> = sqlx::query_scalar::<_, bool>(
        "INSERT INTO offers (store, cashback, link) \
         SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[]) \
         ON CONFLICT (store_key) DO UPDATE SET \
             cashback   = EXCLUDED.cashback, \
             link       = EXCLUDED.link, \
             scraped_at = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&stores)
    .bind(&cashbacks)
    .bind(&links)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let inserted = rows.iter().filter(|&&is_new| is_new).count() as u64;
    let updated = rows.len() as u64 - inserted;

    Ok(UpsertCounts { inserted, updated })
}

/// Returns every offer ordered by store name, case-insensitively.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_offers(pool: &PgPool) -> Result<Vec<OfferRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(
        "SELECT id, store, cashback, link, scraped_at \
         FROM offers \
         ORDER BY store_key ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the number of stored offers.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_offers(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM offers")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
