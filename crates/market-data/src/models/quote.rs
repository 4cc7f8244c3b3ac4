use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Note attached to synthesized quotes so consumers can tell them
/// apart from real market data.
pub const ESTIMATED_NOTE: &str = "Real-time data unavailable";

/// Provenance tier that produced a quote.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Cache,
    Live,
    Scrape,
    Estimated,
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cache => "cache",
            Self::Live => "live",
            Self::Scrape => "scrape",
            Self::Estimated => "estimated",
        };
        write!(f, "{}", name)
    }
}

/// Current market state of a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Normalized symbol
    pub symbol: String,

    /// Current price (required)
    pub price: Decimal,

    /// Absolute change since previous close (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,

    /// Percent change since previous close (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,

    /// Trading volume (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,

    /// When the quote was produced
    pub timestamp: DateTime<Utc>,

    /// Tier that produced the quote
    pub source_tier: SourceTier,

    /// Free-form annotation, set on estimated data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Quote {
    /// Create a quote with minimal required fields.
    pub fn new(symbol: String, price: Decimal, source_tier: SourceTier) -> Self {
        Self {
            symbol,
            price,
            change: None,
            change_percent: None,
            volume: None,
            timestamp: Utc::now(),
            source_tier,
            note: None,
        }
    }

    /// Synthesize a plausible quote for `symbol`.
    ///
    /// Price lands in [1000, 2000), change in [-5, 5), percent change
    /// in [-1, 1), volume in [0, 1_000_000). All money fields carry
    /// two decimal places and the quote is labeled with
    /// [`ESTIMATED_NOTE`].
    pub fn estimated(symbol: &str) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            symbol: symbol.to_string(),
            price: Decimal::new(rng.gen_range(100_000..200_000), 2),
            change: Some(Decimal::new(rng.gen_range(-500..500), 2)),
            change_percent: Some(Decimal::new(rng.gen_range(-100..100), 2)),
            volume: Some(Decimal::from(rng.gen_range(0..1_000_000u32))),
            timestamp: Utc::now(),
            source_tier: SourceTier::Estimated,
            note: Some(ESTIMATED_NOTE.to_string()),
        }
    }
}

/// Net asset value of a mutual fund share class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundNav {
    /// Normalized ISIN
    pub isin: String,

    /// Net asset value per unit
    pub nav: Decimal,

    /// When the value was produced
    pub timestamp: DateTime<Utc>,

    /// Tier that produced the value
    pub source_tier: SourceTier,

    /// Free-form annotation, set on estimated data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FundNav {
    pub fn new(isin: String, nav: Decimal, source_tier: SourceTier) -> Self {
        Self {
            isin,
            nav,
            timestamp: Utc::now(),
            source_tier,
            note: None,
        }
    }

    /// Synthesize a plausible NAV in [10, 1000) with two decimal places.
    pub fn estimated(isin: &str) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            isin: isin.to_string(),
            nav: Decimal::new(rng.gen_range(1_000..100_000), 2),
            timestamp: Utc::now(),
            source_tier: SourceTier::Estimated,
            note: Some(ESTIMATED_NOTE.to_string()),
        }
    }
}
