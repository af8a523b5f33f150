mod offers;
mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::offers::OffersCommands;

#[derive(Debug, Parser)]
#[command(name = "offerhub-cli")]
#[command(about = "OfferHub command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one scrape and reconcile it into the database
    Scrape {
        /// Scrape and print the offers without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect stored offers
    Offers {
        #[command(subcommand)]
        command: OffersCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("offerhub-cli: run with --help to list commands");
        return Ok(());
    };

    let config = offerhub_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Scrape { dry_run: true } = command {
        return scrape::run_dry_scrape(&config).await;
    }

    let pool_config = offerhub_db::PoolConfig::from_app_config(&config);
    let pool = offerhub_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Scrape { .. } => {
            offerhub_db::run_migrations(&pool).await?;
            scrape::run_scrape(&pool, &config).await?;
        }
        Commands::Offers { command } => offers::run(&pool, command).await?,
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            offerhub_db::health_check(&pool).await?;
            println!("database: ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = offerhub_db::run_migrations(&pool).await?;
            println!("migrations: {applied} applied");
        }
    }

    pool.close().await;
    Ok(())
}

/// Marks a scrape run failed, logging rather than propagating if that write
/// itself fails so the original error reaches the caller.
pub(crate) async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = offerhub_db::fail_scrape_run(pool, run_id, &message).await {
        tracing::error!(run_id, error = %mark_err, "failed to mark scrape run as failed");
    }
}
