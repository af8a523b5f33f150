//! Offer types shared by the scraper, the storage layer, and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel used for an absent cashback value or destination link.
pub const NOT_AVAILABLE: &str = "N/A";

/// Returns the deduplication key for a store name: trimmed and lower-cased.
///
/// `"Amazon"` and `" amazon "` share the key `"amazon"`. The storage layer
/// enforces the same key with a unique index on `lower(btrim(store))`.
#[must_use]
pub fn offer_key(store: &str) -> String {
    store.trim().to_lowercase()
}

/// A merchant cashback offer extracted from one rendered card.
///
/// Carries no timestamp: `scraped_at` is assigned by the storage write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Trimmed, non-empty merchant display name.
    pub store: String,
    /// Canonical cashback: `"<n>%"`, `"$<n>"`, or `"N/A"`.
    pub cashback: String,
    /// Destination URL, or `"N/A"` when the card carried none.
    pub link: String,
}

impl Offer {
    #[must_use]
    pub fn key(&self) -> String {
        offer_key(&self.store)
    }
}

/// A persisted offer row: the current value for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub id: i64,
    pub store: String,
    pub cashback: String,
    pub link: String,
    pub scraped_at: DateTime<Utc>,
}

/// Row counts reported by a storage upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertCounts {
    pub inserted: u64,
    pub updated: u64,
}

/// Exported snapshot of the persisted offers.
///
/// Serializes as `{ "last_updated": <ISO timestamp>, "offers": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferSnapshot {
    pub last_updated: DateTime<Utc>,
    pub offers: Vec<OfferRecord>,
}

impl OfferSnapshot {
    /// Builds a snapshot whose `last_updated` is the newest `scraped_at`
    /// among the records, or `now` when there are none.
    #[must_use]
    pub fn from_records(offers: Vec<OfferRecord>, now: DateTime<Utc>) -> Self {
        let last_updated = offers.iter().map(|o| o.scraped_at).max().unwrap_or(now);
        Self {
            last_updated,
            offers,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(id: i64, store: &str, hour: u32) -> OfferRecord {
        OfferRecord {
            id,
            store: store.to_string(),
            cashback: "5%".to_string(),
            link: NOT_AVAILABLE.to_string(),
            scraped_at: Utc.with_ymd_and_hms(2025, 9, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn offer_key_trims_and_lowercases() {
        assert_eq!(offer_key(" Amazon "), "amazon");
        assert_eq!(offer_key("amazon"), offer_key("AMAZON\t"));
    }

    #[test]
    fn snapshot_uses_newest_scraped_at() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let snapshot =
            OfferSnapshot::from_records(vec![record(1, "Bar", 3), record(2, "Foo", 9)], now);
        assert_eq!(
            snapshot.last_updated,
            Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn snapshot_of_empty_store_uses_now() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let snapshot = OfferSnapshot::from_records(vec![], now);
        assert_eq!(snapshot.last_updated, now);
        assert!(snapshot.offers.is_empty());
    }

    #[test]
    fn snapshot_serializes_expected_shape() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let snapshot = OfferSnapshot::from_records(vec![record(7, "Foo", 1)], now);
        let json = serde_json::to_value(&snapshot).expect("serialize snapshot");
        assert!(json["last_updated"].is_string());
        let offer = &json["offers"][0];
        assert_eq!(offer["id"], 7);
        assert_eq!(offer["store"], "Foo");
        assert_eq!(offer["cashback"], "5%");
        assert_eq!(offer["link"], "N/A");
        assert!(offer["scraped_at"].is_string());
    }
}
