//! Background scrape execution shared by every server-side trigger.

use std::sync::Arc;

use offerhub_db::{DbError, PgOfferStore, ScrapeRunRow, ScrapeRunStats, TriggerSource};
use offerhub_scraper::{run_pipeline, ScrapeSlot, ScrapeSlotGuard, Scraper, WebDriverSessionFactory};
use sqlx::PgPool;

pub type WebScraper = Scraper<WebDriverSessionFactory>;

/// Owns the scraper and the single-flight slot. One instance per process.
pub struct ScrapeJobs {
    pool: PgPool,
    scraper: WebScraper,
    slot: ScrapeSlot,
}

impl ScrapeJobs {
    pub fn new(pool: PgPool, scraper: WebScraper, slot: ScrapeSlot) -> Self {
        Self {
            pool,
            scraper,
            slot,
        }
    }

    pub fn slot(&self) -> &ScrapeSlot {
        &self.slot
    }

    /// Claims the slot, records a queued run and starts the pipeline on a
    /// background task.
    ///
    /// Returns `Ok(None)` without side effects when a scrape is already in
    /// flight, either in this process or in another one sharing the database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the run row cannot be created; the slot is
    /// released again in that case.
    pub async fn spawn(
        self: &Arc<Self>,
        trigger: TriggerSource,
    ) -> Result<Option<ScrapeRunRow>, DbError> {
        let Some(guard) = self.slot.try_acquire() else {
            return Ok(None);
        };

        let run = match offerhub_db::create_scrape_run(&self.pool, trigger).await {
            Ok(run) => run,
            Err(DbError::ScrapeRunActive) => {
                tracing::info!(trigger = %trigger, "scrape already running in another process");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let jobs = Arc::clone(self);
        let run_id = run.id;
        tokio::spawn(async move {
            jobs.execute(run_id, trigger, guard).await;
        });

        Ok(Some(run))
    }

    async fn execute(&self, run_id: i64, trigger: TriggerSource, _guard: ScrapeSlotGuard) {
        if let Err(e) = offerhub_db::start_scrape_run(&self.pool, run_id).await {
            tracing::error!(run_id, error = %e, "failed to mark scrape run as running");
            self.fail_best_effort(run_id, &e.to_string()).await;
            return;
        }

        tracing::info!(run_id, trigger = %trigger, "scrape run started");
        let store = PgOfferStore::new(self.pool.clone());

        match run_pipeline(&self.scraper, &store).await {
            Ok(report) => {
                tracing::info!(
                    run_id,
                    offers = report.offers,
                    inserted = report.inserted,
                    updated = report.updated,
                    skipped = report.skipped,
                    convergence = %report.convergence,
                    "scrape run succeeded"
                );
                let stats = ScrapeRunStats::new(
                    report.raw_cards,
                    report.skipped,
                    report.convergence.as_str(),
                    report.inserted,
                    report.updated,
                );
                if let Err(e) = offerhub_db::complete_scrape_run(&self.pool, run_id, stats).await {
                    tracing::error!(run_id, error = %e, "failed to record scrape run success");
                    self.fail_best_effort(run_id, &e.to_string()).await;
                }
            }
            Err(e) => {
                tracing::error!(run_id, error = %e, "scrape run failed");
                self.fail_best_effort(run_id, &e.to_string()).await;
            }
        }
    }

    async fn fail_best_effort(&self, run_id: i64, message: &str) {
        if let Err(mark_err) = offerhub_db::fail_scrape_run(&self.pool, run_id, message).await {
            tracing::error!(run_id, error = %mark_err, "failed to record scrape run failure");
        }
    }
}

/// Starts one scrape when the offers table is empty, so a fresh deployment
/// has data before the first cron tick.
pub async fn spawn_initial_scrape_if_empty(jobs: &Arc<ScrapeJobs>) {
    match offerhub_db::count_offers(&jobs.pool).await {
        Ok(0) => match jobs.spawn(TriggerSource::Startup).await {
            Ok(Some(run)) => {
                tracing::info!(run_id = run.id, "offers table empty; initial scrape started");
            }
            Ok(None) => tracing::info!("initial scrape skipped; a scrape is already running"),
            Err(e) => tracing::error!(error = %e, "failed to start initial scrape"),
        },
        Ok(count) => tracing::debug!(count, "offers present; no initial scrape"),
        Err(e) => tracing::error!(error = %e, "failed to count offers at startup"),
    }
}
