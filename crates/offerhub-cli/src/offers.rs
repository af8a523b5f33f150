use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use offerhub_core::{OfferRecord, OfferSnapshot};

#[derive(Debug, Subcommand)]
pub enum OffersCommands {
    /// Print stored offers, ordered by store
    List,
    /// Write the `{ last_updated, offers }` snapshot as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub(crate) async fn run(pool: &sqlx::PgPool, command: OffersCommands) -> anyhow::Result<()> {
    let rows = offerhub_db::list_offers(pool).await?;
    let records: Vec<OfferRecord> = rows.into_iter().map(OfferRecord::from).collect();

    match command {
        OffersCommands::List => {
            if records.is_empty() {
                println!("no offers stored; run `offerhub-cli scrape` first");
            }
            for record in &records {
                println!("{}", format_offer_line(record));
            }
        }
        OffersCommands::Export { out } => {
            let json = render_snapshot(records)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    tracing::info!(path = %path.display(), "snapshot written");
                }
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

pub(crate) fn format_offer_line(record: &OfferRecord) -> String {
    format!(
        "{:<32} {:>8}  {}  {}",
        record.store,
        record.cashback,
        record.scraped_at.format("%Y-%m-%d %H:%M"),
        record.link
    )
}

pub(crate) fn render_snapshot(records: Vec<OfferRecord>) -> anyhow::Result<String> {
    let snapshot = OfferSnapshot::from_records(records, Utc::now());
    Ok(serde_json::to_string_pretty(&snapshot)?)
}
