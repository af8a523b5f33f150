//! One scrape: open a session, load every card, extract, deduplicate.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use offerhub_core::{AppConfig, Offer};

use crate::error::ScrapeError;
use crate::extract::{extract_offer, ExtractPolicy, Extraction};
use crate::loader::{load_all_cards, LoadPolicy};
use crate::session::{PageSession, SessionFactory};
use crate::types::{Convergence, ScrapeResult};

/// Selector for one merchant card on the listing page.
pub const CARD_SELECTOR: &str = "div.cursor_pointer.pos_relative";

/// Everything a [`Scraper`] needs to know about the target page.
#[derive(Debug, Clone)]
pub struct ScrapePolicy {
    pub target_url: String,
    pub navigation_timeout: Duration,
    pub load: LoadPolicy,
    pub extract: ExtractPolicy,
}

impl ScrapePolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            target_url: config.target_url.clone(),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            load: LoadPolicy {
                card_selector: CARD_SELECTOR.to_string(),
                scroll_delta_px: config.scroll_delta_px,
                settle: Duration::from_millis(config.scroll_settle_ms),
                step_timeout: Duration::from_secs(config.step_timeout_secs),
                max_rounds: config.max_scroll_rounds,
                stable_threshold: config.stable_rounds,
            },
            extract: ExtractPolicy {
                max_retries: config.extract_max_retries,
                read_timeout: Duration::from_secs(config.step_timeout_secs),
                ..ExtractPolicy::default()
            },
        }
    }
}

/// Runs scrapes against the target page through sessions from `F`.
#[derive(Debug)]
pub struct Scraper<F> {
    factory: F,
    policy: ScrapePolicy,
}

impl<F: SessionFactory> Scraper<F> {
    pub fn new(factory: F, policy: ScrapePolicy) -> Self {
        Self { factory, policy }
    }

    /// Performs one full scrape.
    ///
    /// The session is closed on every path once it has been opened. A close
    /// failure is logged and never replaces the scrape outcome.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::NavigationFailed`] if the session cannot be opened
    ///   or the page does not load in time.
    /// - [`ScrapeError::LoadAborted`] if a loader step fails.
    pub async fn run_scrape(&self) -> Result<ScrapeResult, ScrapeError> {
        let started_at = Utc::now();
        tracing::info!(url = %self.policy.target_url, "starting scrape");

        let session = self
            .factory
            .open(&self.policy.target_url, self.policy.navigation_timeout)
            .await
            .map_err(ScrapeError::NavigationFailed)?;

        let outcome = self.collect(&session).await;

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close browser session");
        }

        let result = ScrapeResult {
            started_at,
            ..outcome?
        };
        tracing::info!(
            offers = result.offers.len(),
            raw_cards = result.raw_cards,
            skipped = result.skipped,
            convergence = %result.convergence,
            rounds = result.rounds,
            "scrape finished"
        );
        Ok(result)
    }

    async fn collect(&self, session: &F::Session) -> Result<ScrapeResult, ScrapeError> {
        let loaded = load_all_cards(session, &self.policy.load).await?;
        if loaded.convergence == Convergence::ExhaustedAttempts {
            tracing::warn!(
                rounds = loaded.rounds,
                cards = loaded.cards.len(),
                "card count still changing at round ceiling; result may be incomplete"
            );
        }

        // Keyed by normalized store; later cards overwrite earlier ones.
        let mut by_key: BTreeMap<String, Offer> = BTreeMap::new();
        let mut skipped = 0usize;

        for (index, card) in loaded.cards.iter().enumerate() {
            match extract_offer(card, self.policy.extract).await {
                Ok(Extraction::Offer(offer)) => {
                    by_key.insert(offer.key(), offer);
                }
                Ok(Extraction::Skipped) => skipped += 1,
                Err(e) => {
                    tracing::warn!(card = index, error = %e, "card extraction failed; skipping");
                    skipped += 1;
                }
            }
        }

        Ok(ScrapeResult {
            offers: by_key.into_values().collect(),
            started_at: Utc::now(),
            raw_cards: loaded.cards.len(),
            skipped,
            convergence: loaded.convergence,
            rounds: loaded.rounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::test_support::{FakeCard, FakeFactory, FakePage};

    fn test_policy() -> ScrapePolicy {
        ScrapePolicy {
            target_url: "https://offers.test/all-stores".to_string(),
            navigation_timeout: Duration::from_secs(1),
            load: LoadPolicy {
                card_selector: CARD_SELECTOR.to_string(),
                scroll_delta_px: 1000,
                settle: Duration::ZERO,
                step_timeout: Duration::from_millis(200),
                max_rounds: 20,
                stable_threshold: 3,
            },
            extract: ExtractPolicy {
                max_retries: 1,
                backoff_base: Duration::ZERO,
                read_timeout: Duration::from_millis(100),
            },
        }
    }

    #[tokio::test]
    async fn scrape_extracts_normalizes_and_counts_skips() {
        let page = FakePage::static_page(vec![
            FakeCard::offer("Foo", "11%", "https://foo.test"),
            FakeCard::offer("Bar", "800", ""),
            FakeCard::offer("", "5", "https://nameless.test"),
        ]);
        let scraper = Scraper::new(FakeFactory::new(page.clone()), test_policy());

        let result = scraper.run_scrape().await.unwrap();

        assert_eq!(result.raw_cards, 3);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.convergence, Convergence::Converged);
        let pairs: Vec<(&str, &str)> = result
            .offers
            .iter()
            .map(|o| (o.store.as_str(), o.cashback.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Bar", "$800"), ("Foo", "11%")]);
        assert_eq!(page.closes(), 1);
    }

    #[tokio::test]
    async fn duplicate_stores_keep_last_extracted() {
        let page = FakePage::static_page(vec![
            FakeCard::offer("Amazon", "5%", "https://a.test/1"),
            FakeCard::offer(" amazon ", "7%", "https://a.test/2"),
        ]);
        let scraper = Scraper::new(FakeFactory::new(page), test_policy());

        let result = scraper.run_scrape().await.unwrap();

        assert_eq!(result.offers.len(), 1);
        assert_eq!(result.offers[0].store, "amazon");
        assert_eq!(result.offers[0].cashback, "7%");
        assert_eq!(result.offers[0].link, "https://a.test/2");
    }

    #[tokio::test]
    async fn failing_card_is_skipped_and_batch_continues() {
        let page = FakePage::static_page(vec![
            FakeCard::offer("Flaky", "5%", "").failing_reads(100),
            FakeCard::offer("Solid", "3%", ""),
        ]);
        let scraper = Scraper::new(FakeFactory::new(page.clone()), test_policy());

        let result = scraper.run_scrape().await.unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.offers.len(), 1);
        assert_eq!(result.offers[0].store, "Solid");
        assert_eq!(page.closes(), 1);
    }

    #[tokio::test]
    async fn stalled_card_is_skipped_and_scrape_finishes() {
        let page = FakePage::static_page(vec![
            FakeCard::offer("Stuck", "5%", "").stalled(),
            FakeCard::offer("Solid", "3%", ""),
        ]);
        let scraper = Scraper::new(FakeFactory::new(page.clone()), test_policy());

        let result = tokio::time::timeout(Duration::from_secs(5), scraper.run_scrape())
            .await
            .expect("scrape must not hang on a stalled card")
            .unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.offers.len(), 1);
        assert_eq!(result.offers[0].store, "Solid");
        assert_eq!(page.closes(), 1);
    }

    #[tokio::test]
    async fn navigation_failure_is_fatal_and_opens_nothing_to_close() {
        let page = FakePage::static_page(vec![FakeCard::offer("Foo", "1%", "")]);
        let mut factory = FakeFactory::new(page.clone());
        factory.fail_navigation = true;
        let scraper = Scraper::new(factory, test_policy());

        let err = scraper.run_scrape().await.unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::NavigationFailed(SessionError::Navigation { .. })
        ));
        assert_eq!(page.closes(), 0);
    }

    #[tokio::test]
    async fn loader_failure_still_closes_session() {
        let page = FakePage::static_page(vec![FakeCard::offer("Foo", "1%", "")]).hanging_at(1);
        let scraper = Scraper::new(FakeFactory::new(page.clone()), test_policy());

        let err = scraper.run_scrape().await.unwrap_err();

        assert!(matches!(err, ScrapeError::LoadAborted { rounds: 1, .. }));
        assert_eq!(page.closes(), 1);
    }

    #[test]
    fn policy_follows_app_config() {
        let lookup = |key: &str| match key {
            "DATABASE_URL" => Ok("postgres://u:p@localhost/offers".to_string()),
            "OFFERHUB_STABLE_ROUNDS" => Ok("4".to_string()),
            "OFFERHUB_SCROLL_SETTLE_MS" => Ok("500".to_string()),
            _ => Err(std::env::VarError::NotPresent),
        };
        let config = offerhub_core::build_app_config(lookup).unwrap();
        let policy = ScrapePolicy::from_app_config(&config);
        assert_eq!(policy.load.stable_threshold, 4);
        assert_eq!(policy.load.settle, Duration::from_millis(500));
        assert_eq!(policy.load.max_rounds, 20);
        assert_eq!(policy.load.card_selector, CARD_SELECTOR);
        assert_eq!(policy.navigation_timeout, Duration::from_secs(90));
        assert_eq!(policy.extract.max_retries, 2);
        assert_eq!(policy.extract.read_timeout, Duration::from_secs(30));
    }
}
