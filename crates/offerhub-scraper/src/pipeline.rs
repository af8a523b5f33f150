use chrono::{DateTime, Utc};
use offerhub_core::OfferStore;
use serde::Serialize;

use crate::error::PipelineError;
use crate::orchestrator::Scraper;
use crate::reconcile::{reconcile, ReconcileOutcome};
use crate::session::SessionFactory;
use crate::types::{Convergence, ScrapeResult};

/// Summary of one scrape-and-reconcile pass.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub offers: usize,
    pub raw_cards: usize,
    pub skipped: usize,
    pub convergence: Convergence,
    pub rounds: u32,
    pub inserted: u64,
    pub updated: u64,
    pub skipped_empty: bool,
}

impl PipelineReport {
    #[must_use]
    pub fn new(result: &ScrapeResult, outcome: ReconcileOutcome) -> Self {
        Self {
            started_at: result.started_at,
            offers: result.offers.len(),
            raw_cards: result.raw_cards,
            skipped: result.skipped,
            convergence: result.convergence,
            rounds: result.rounds,
            inserted: outcome.inserted,
            updated: outcome.updated,
            skipped_empty: outcome.skipped_empty,
        }
    }
}

/// Scrapes once and reconciles the result into `store`.
///
/// A failed scrape never reaches the store.
///
/// # Errors
///
/// Returns [`PipelineError::Scrape`] or [`PipelineError::Reconcile`] from the
/// failing stage.
pub async fn run_pipeline<F, S>(
    scraper: &Scraper<F>,
    store: &S,
) -> Result<PipelineReport, PipelineError>
where
    F: SessionFactory,
    S: OfferStore,
{
    let result = scraper.run_scrape().await?;
    let outcome = reconcile(store, &result).await?;
    Ok(PipelineReport::new(&result, outcome))
}
