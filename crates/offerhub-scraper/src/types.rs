use chrono::{DateTime, Utc};
use offerhub_core::Offer;
use serde::Serialize;

/// How the incremental loader stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Convergence {
    /// The card count stayed flat for the configured number of rounds.
    Converged,
    /// The round ceiling was hit while the count was still moving. The
    /// result may be incomplete but is not an error.
    ExhaustedAttempts,
}

impl Convergence {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::ExhaustedAttempts => "exhausted-attempts",
        }
    }
}

impl std::fmt::Display for Convergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one scrape: offers unique by store key plus run metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    /// One offer per [`offerhub_core::offer_key`], ordered by key.
    pub offers: Vec<Offer>,
    pub started_at: DateTime<Utc>,
    /// Cards observed on the page when loading stopped.
    pub raw_cards: usize,
    /// Cards without a usable name or whose attribute reads kept failing.
    pub skipped: usize,
    pub convergence: Convergence,
    /// Loader probe rounds executed.
    pub rounds: u32,
}

impl ScrapeResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convergence_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(Convergence::ExhaustedAttempts).unwrap(),
            "exhausted-attempts"
        );
        assert_eq!(
            serde_json::to_value(Convergence::Converged).unwrap(),
            "converged"
        );
    }

    #[test]
    fn convergence_display_matches_serde() {
        assert_eq!(
            Convergence::ExhaustedAttempts.to_string(),
            Convergence::ExhaustedAttempts.as_str()
        );
    }
}
