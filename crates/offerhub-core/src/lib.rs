mod app_config;
mod config;
mod offers;
mod store;

pub use app_config::{AppConfig, Environment};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use offers::{offer_key, Offer, OfferRecord, OfferSnapshot, UpsertCounts, NOT_AVAILABLE};
pub use store::OfferStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
