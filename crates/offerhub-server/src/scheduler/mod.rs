//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring scrape.

use std::sync::Arc;

use offerhub_db::TriggerSource;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::jobs::ScrapeJobs;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle. Keep it alive for the
/// lifetime of the process and call `shutdown` on exit.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `cron` does not parse, or the scheduler fails to start.
pub async fn build_scheduler(
    jobs: Arc<ScrapeJobs>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    scheduler.add(scrape_job(jobs, cron)?).await?;
    scheduler.start().await?;
    tracing::info!(cron, "scheduler: recurring scrape registered");
    Ok(scheduler)
}

/// The recurring scrape. A tick that lands while another scrape holds the
/// slot is skipped, not queued.
fn scrape_job(jobs: Arc<ScrapeJobs>, cron: &str) -> Result<Job, JobSchedulerError> {
    Job::new_async(cron, move |_uuid, _lock| {
        let jobs = Arc::clone(&jobs);

        Box::pin(async move {
            match jobs.spawn(TriggerSource::Scheduler).await {
                Ok(Some(run)) => {
                    tracing::info!(run_id = run.id, "scheduler: scrape started");
                }
                Ok(None) => {
                    tracing::info!("scheduler: scrape already running; skipping tick");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: failed to start scrape");
                }
            }
        })
    })
}
