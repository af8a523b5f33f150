//! One-off scrape commands.

use offerhub_core::AppConfig;
use offerhub_db::{PgOfferStore, ScrapeRunStats, TriggerSource};
use offerhub_scraper::{
    run_pipeline, PipelineReport, ScrapePolicy, ScrapeResult, Scraper, WebDriverSessionFactory,
};

use crate::fail_run_best_effort;

fn build_scraper(config: &AppConfig) -> Scraper<WebDriverSessionFactory> {
    Scraper::new(
        WebDriverSessionFactory::new(&config.webdriver_url),
        ScrapePolicy::from_app_config(config),
    )
}

/// Scrapes the listing and prints what would be stored. No database access.
///
/// # Errors
///
/// Returns an error if the page cannot be loaded.
pub(crate) async fn run_dry_scrape(config: &AppConfig) -> anyhow::Result<()> {
    let result = build_scraper(config).run_scrape().await?;

    for offer in &result.offers {
        println!("{}\t{}\t{}", offer.store, offer.cashback, offer.link);
    }
    println!("dry-run: {}", dry_run_summary(&result));
    Ok(())
}

/// Runs the full pipeline with `scrape_runs` bookkeeping under the `cli`
/// trigger.
///
/// # Errors
///
/// Returns an error if the run row cannot be created or started, or if the
/// scrape or reconcile fails. The run is marked failed before returning.
/// Creation is refused while any other process has a scrape queued or
/// running.
pub(crate) async fn run_scrape(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let scraper = build_scraper(config);
    let store = PgOfferStore::new(pool.clone());

    let run = offerhub_db::create_scrape_run(pool, TriggerSource::Cli).await?;
    if let Err(e) = offerhub_db::start_scrape_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let report = match run_pipeline(&scraper, &store).await {
        Ok(report) => report,
        Err(e) => {
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            return Err(e.into());
        }
    };

    let stats = ScrapeRunStats::new(
        report.raw_cards,
        report.skipped,
        report.convergence.as_str(),
        report.inserted,
        report.updated,
    );
    if let Err(e) = offerhub_db::complete_scrape_run(pool, run.id, stats).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    println!("scrape run {}: {}", run.public_id, report_summary(&report));
    Ok(())
}

pub(crate) fn dry_run_summary(result: &ScrapeResult) -> String {
    format!(
        "{} offers from {} cards ({} skipped), {} after {} rounds",
        result.offers.len(),
        result.raw_cards,
        result.skipped,
        result.convergence,
        result.rounds
    )
}

pub(crate) fn report_summary(report: &PipelineReport) -> String {
    if report.skipped_empty {
        return format!(
            "no offers scraped ({}, {} rounds); stored offers left unchanged",
            report.convergence, report.rounds
        );
    }
    format!(
        "{} offers ({} inserted, {} updated, {} cards skipped), {}",
        report.offers, report.inserted, report.updated, report.skipped, report.convergence
    )
}
