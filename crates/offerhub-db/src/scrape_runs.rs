//! Database operations for `scrape_runs`.
//!
//! One row per pipeline invocation: `queued` → `running` → `succeeded` or
//! `failed`. Each transition is guarded by the expected current status.
//!
//! At most one run is `queued` or `running` at a time across every process
//! sharing the database (partial unique index `scrape_runs_one_active_idx`).
//! That row is the cross-process scrape lock: the server and the CLI both
//! claim it through [`create_scrape_run`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// What started a scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Http,
    Scheduler,
    Startup,
    Cli,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Scheduler => "scheduler",
            Self::Startup => "startup",
            Self::Cli => "cli",
        }
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row from the `scrape_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub raw_cards: i32,
    pub skipped: i32,
    /// `converged` or `exhausted-attempts`; `NULL` until the run succeeds.
    pub convergence: Option<String>,
    pub inserted: i32,
    pub updated: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counters recorded when a run succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapeRunStats<'a> {
    pub raw_cards: i32,
    pub skipped: i32,
    pub convergence: &'a str,
    pub inserted: i32,
    pub updated: i32,
}

impl<'a> ScrapeRunStats<'a> {
    /// Builds the column values from pipeline counters, clamping each to
    /// `i32::MAX`.
    #[must_use]
    pub fn new(
        raw_cards: usize,
        skipped: usize,
        convergence: &'a str,
        inserted: u64,
        updated: u64,
    ) -> Self {
        Self {
            raw_cards: i32::try_from(raw_cards).unwrap_or(i32::MAX),
            skipped: i32::try_from(skipped).unwrap_or(i32::MAX),
            convergence,
            inserted: i32::try_from(inserted).unwrap_or(i32::MAX),
            updated: i32::try_from(updated).unwrap_or(i32::MAX),
        }
    }
}

/// Active runs older than this are treated as left behind by a crashed
/// process and failed before a new run is claimed.
const ABANDONED_AFTER_SECS: f64 = 2.0 * 60.0 * 60.0;

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
                           raw_cards, skipped, convergence, inserted, updated, error_message, \
                           created_at";

/// Claims the scrape lock by creating a new run in `queued` status and
/// returns the full row.
///
/// Active runs created more than two hours ago are marked `failed` first, so
/// a process that died mid-scrape cannot block scraping forever.
///
/// # Errors
///
/// Returns [`DbError::ScrapeRunActive`] if another run is still `queued` or
/// `running`, or [`DbError::Sqlx`] if a query fails.
pub async fn create_scrape_run(
    pool: &PgPool,
    trigger_source: TriggerSource,
) -> Result<ScrapeRunRow, DbError> {
    sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'failed', completed_at = NOW(), \
             error_message = 'abandoned: run never finished' \
         WHERE status IN ('queued', 'running') \
           AND created_at < NOW() - make_interval(secs => $1)",
    )
    .bind(ABANDONED_AFTER_SECS)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "INSERT INTO scrape_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'queued') \
         ON CONFLICT DO NOTHING \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(trigger_source.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::ScrapeRunActive)?;

    Ok(row)
}

/// Marks a `queued` run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeRunTransition`] if the run is not
/// `queued`, or [`DbError::Sqlx`] if the update fails.
pub async fn start_scrape_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a `running` run as `succeeded` and records its counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scrape_run(
    pool: &PgPool,
    id: i64,
    stats: ScrapeRunStats<'_>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             raw_cards = $1, skipped = $2, convergence = $3, inserted = $4, updated = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(stats.raw_cards)
    .bind(stats.skipped)
    .bind(stats.convergence)
    .bind(stats.inserted)
    .bind(stats.updated)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a `queued` or `running` run as `failed` with an error message.
///
/// A `queued` run is failed when it could not be started, which also
/// releases the scrape lock.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeRunTransition`] if the run has already
/// finished, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scrape_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status IN ('queued', 'running')",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeRunTransition {
            id,
            expected_status: "queued or running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such run exists, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_scrape_run(pool: &PgPool, id: i64) -> Result<ScrapeRunRow, DbError> {
    let row = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM scrape_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_runs(pool: &PgPool, limit: i64) -> Result<Vec<ScrapeRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM scrape_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
