//! Cashback normalization from free-form card text to one canonical string.
//!
//! Canonical shapes:
//! - `"<n>%"`: percentage, trailing `.0` suppressed (`"11%"`, `"2.5%"`),
//! - `"$<n>"`: whole-dollar amount,
//! - `"N/A"`: nothing usable on the card.
//!
//! ## Percent values above 100
//! The listing occasionally labels a flat dollar reward as a percentage
//! (`"800%"`). Any percentage above 100 is rendered as dollars, truncated to
//! an integer. This is a data-quality heuristic, not a guarantee about what
//! the site meant.
//!
//! ## Pass-through
//! Text that carries no parseable number is returned trimmed but otherwise
//! untouched. Normalization never fails.

use std::sync::LazyLock;

use offerhub_core::NOT_AVAILABLE;
use regex::Regex;

/// Above this value a percentage is treated as a mislabeled dollar amount.
const PERCENT_CEILING: f64 = 100.0;

/// First number in percent text: `1,000`, `1,000.5`, `.5`, `2.5` or `11`,
/// with an optional `-` directly in front.
static CASHBACK_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d*\.\d+|\d+)")
        .expect("valid cashback number regex")
});

/// Normalizes a raw cashback attribute into its canonical form.
///
/// Total and idempotent: `normalize_cashback(Some(&normalize_cashback(x)))`
/// equals `normalize_cashback(x)` for every input.
#[must_use]
pub fn normalize_cashback(raw: Option<&str>) -> String {
    let Some(trimmed) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return NOT_AVAILABLE.to_string();
    };

    if trimmed.contains('%') {
        return match percent_value(trimmed) {
            Some(value) => render(value),
            None => trimmed.to_string(),
        };
    }

    if trimmed.contains('$') {
        return trimmed.to_string();
    }

    match parse_finite(trimmed) {
        Some(value) => render(value),
        None => trimmed.to_string(),
    }
}

fn render(value: f64) -> String {
    if value > PERCENT_CEILING {
        format!("${}", truncate_to_dollars(value))
    } else {
        // `f64`'s `Display` already omits a zero fractional part: 11.0 -> "11".
        format!("{value}%")
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_to_dollars(value: f64) -> i64 {
    // Saturating float-to-int cast; only reached for finite values > 100.
    value.trunc() as i64
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses the first number in percent text, thousands separators removed.
///
/// `"Up to 11%"` yields `11.0`, `"1,000%"` yields `1000.0`.
fn percent_value(s: &str) -> Option<f64> {
    let token = CASHBACK_NUMBER_RE.find(s)?.as_str().replace(',', "");
    parse_finite(&token)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
