//! Scrape-and-reconcile pipeline for merchant cashback offers.
//!
//! [`Scraper`] drives a browser session over the listing page until the card
//! count converges, extracts one [`offerhub_core::Offer`] per card, and
//! deduplicates by store. [`reconcile`] writes the result into any
//! [`offerhub_core::OfferStore`]. [`ScrapeSlot`] keeps scrapes single-flight.

pub mod error;
pub mod extract;
pub mod loader;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod reconcile;
mod retry;
pub mod session;
pub mod slot;
pub mod types;
pub mod webdriver;

#[cfg(test)]
mod test_support;

pub use error::{PipelineError, ReconcileError, ScrapeError, SessionError};
pub use extract::{extract_offer, ExtractPolicy, Extraction};
pub use loader::{load_all_cards, LoadOutcome, LoadPolicy};
pub use normalize::normalize_cashback;
pub use orchestrator::{ScrapePolicy, Scraper, CARD_SELECTOR};
pub use pipeline::{run_pipeline, PipelineReport};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use session::{CardHandle, PageSession, SessionFactory};
pub use slot::{ScrapeSlot, ScrapeSlotGuard};
pub use types::{Convergence, ScrapeResult};
pub use webdriver::{WebDriverCard, WebDriverPage, WebDriverSessionFactory};
