mod api;
mod jobs;
mod middleware;
mod scheduler;

use std::sync::Arc;

use offerhub_scraper::{ScrapePolicy, ScrapeSlot, Scraper, WebDriverSessionFactory};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};
use crate::jobs::ScrapeJobs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = offerhub_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = offerhub_db::PoolConfig::from_app_config(&config);
    let pool = offerhub_db::connect_pool(&config.database_url, pool_config).await?;
    offerhub_db::run_migrations(&pool).await?;

    let scraper = Scraper::new(
        WebDriverSessionFactory::new(&config.webdriver_url),
        ScrapePolicy::from_app_config(&config),
    );
    let jobs = Arc::new(ScrapeJobs::new(pool.clone(), scraper, ScrapeSlot::new()));

    let mut scheduler = scheduler::build_scheduler(Arc::clone(&jobs), &config.scrape_cron).await?;
    jobs::spawn_initial_scrape_if_empty(&jobs).await;

    let app = build_app(AppState { pool, jobs }, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "offerhub server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "scheduler did not shut down cleanly");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
