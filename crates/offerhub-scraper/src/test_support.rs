//! In-memory page session and offer store used by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use offerhub_core::{Offer, OfferRecord, OfferStore, UpsertCounts};

use crate::error::SessionError;
use crate::extract::{ATTR_CASHBACK, ATTR_LINK, ATTR_NAME};
use crate::session::{CardHandle, PageSession, SessionFactory};

type Growth = Arc<dyn Fn(u32) -> usize + Send + Sync>;

#[derive(Debug, Clone)]
pub(crate) struct FakeCard {
    attrs: Arc<HashMap<&'static str, String>>,
    failures_left: Arc<AtomicU32>,
    stalled: bool,
    reads: Arc<AtomicU32>,
}

impl FakeCard {
    pub(crate) fn offer(name: &str, cashback: &str, link: &str) -> Self {
        let mut attrs = HashMap::new();
        if !name.is_empty() {
            attrs.insert(ATTR_NAME, name.to_owned());
        }
        if !cashback.is_empty() {
            attrs.insert(ATTR_CASHBACK, cashback.to_owned());
        }
        if !link.is_empty() {
            attrs.insert(ATTR_LINK, link.to_owned());
        }
        Self {
            attrs: Arc::new(attrs),
            failures_left: Arc::new(AtomicU32::new(0)),
            stalled: false,
            reads: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Makes the next `n` attribute reads on this card fail.
    pub(crate) fn failing_reads(self, n: u32) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Makes every attribute read on this card wait forever.
    pub(crate) fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    /// Attribute reads started on this card, including stalled ones.
    pub(crate) fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl CardHandle for FakeCard {
    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.stalled {
            std::future::pending::<()>().await;
        }
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(SessionError::Command("stale element reference".to_owned()));
        }
        Ok(self.attrs.get(name).cloned())
    }
}

/// A page whose visible card count after `n` scrolls is `growth(n)`,
/// capped at the catalog size.
#[derive(Clone)]
pub(crate) struct FakePage {
    catalog: Arc<Vec<FakeCard>>,
    growth: Growth,
    scrolls: Arc<AtomicU32>,
    hang_scroll_at: Option<u32>,
    closes: Arc<AtomicUsize>,
}

impl FakePage {
    pub(crate) fn new(catalog: Vec<FakeCard>, growth: impl Fn(u32) -> usize + Send + Sync + 'static) -> Self {
        Self {
            catalog: Arc::new(catalog),
            growth: Arc::new(growth),
            scrolls: Arc::new(AtomicU32::new(0)),
            hang_scroll_at: None,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shows the whole catalog from the first sample on.
    pub(crate) fn static_page(catalog: Vec<FakeCard>) -> Self {
        let len = catalog.len();
        Self::new(catalog, move |_| len)
    }

    /// The `n`-th scroll (1-based) never completes.
    pub(crate) fn hanging_at(mut self, n: u32) -> Self {
        self.hang_scroll_at = Some(n);
        self
    }

    pub(crate) fn scrolls(&self) -> u32 {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn visible(&self) -> usize {
        (self.growth)(self.scrolls()).min(self.catalog.len())
    }
}

impl PageSession for FakePage {
    type Card = FakeCard;

    async fn scroll(&self, _delta_px: i64) -> Result<(), SessionError> {
        let n = self.scrolls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.hang_scroll_at == Some(n) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn query_all(&self, _selector: &str) -> Result<Vec<FakeCard>, SessionError> {
        Ok(self.catalog[..self.visible()].to_vec())
    }

    async fn close(self) -> Result<(), SessionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out clones of one [`FakePage`] so tests can inspect it afterwards.
pub(crate) struct FakeFactory {
    pub(crate) page: FakePage,
    pub(crate) fail_navigation: bool,
    pub(crate) opened: AtomicBool,
}

impl FakeFactory {
    pub(crate) fn new(page: FakePage) -> Self {
        Self {
            page,
            fail_navigation: false,
            opened: AtomicBool::new(false),
        }
    }
}

impl SessionFactory for FakeFactory {
    type Session = FakePage;

    async fn open(&self, url: &str, _timeout: Duration) -> Result<FakePage, SessionError> {
        self.opened.store(true, Ordering::SeqCst);
        if self.fail_navigation {
            return Err(SessionError::Navigation {
                url: url.to_owned(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_owned(),
            });
        }
        Ok(self.page.clone())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("memory store: {0}")]
pub(crate) struct MemoryStoreError(&'static str);

/// [`OfferStore`] over a map keyed by [`offerhub_core::offer_key`].
#[derive(Default)]
pub(crate) struct MemoryStore {
    rows: Mutex<BTreeMap<String, OfferRecord>>,
    next_id: AtomicI64,
    pub(crate) down: AtomicBool,
    pub(crate) fail_writes: AtomicBool,
    pub(crate) writes: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn seeded(offers: &[Offer]) -> Self {
        let store = Self::default();
        store.apply(offers);
        store
    }

    pub(crate) fn snapshot(&self) -> Vec<OfferRecord> {
        self.rows
            .lock()
            .expect("memory store lock")
            .values()
            .cloned()
            .collect()
    }

    fn apply(&self, offers: &[Offer]) -> UpsertCounts {
        let mut rows = self.rows.lock().expect("memory store lock");
        let mut counts = UpsertCounts::default();
        for offer in offers {
            let now = Utc::now();
            match rows.get_mut(&offer.key()) {
                Some(row) => {
                    row.cashback.clone_from(&offer.cashback);
                    row.link.clone_from(&offer.link);
                    row.scraped_at = now;
                    counts.updated += 1;
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                    rows.insert(
                        offer.key(),
                        OfferRecord {
                            id,
                            store: offer.store.clone(),
                            cashback: offer.cashback.clone(),
                            link: offer.link.clone(),
                            scraped_at: now,
                        },
                    );
                    counts.inserted += 1;
                }
            }
        }
        counts
    }
}

impl OfferStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn ping(&self) -> Result<(), MemoryStoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(MemoryStoreError("connection refused"));
        }
        Ok(())
    }

    async fn upsert_many(&self, offers: &[Offer]) -> Result<UpsertCounts, MemoryStoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MemoryStoreError("write rejected"));
        }
        Ok(self.apply(offers))
    }

    async fn list_all(&self) -> Result<Vec<OfferRecord>, MemoryStoreError> {
        Ok(self.snapshot())
    }
}
