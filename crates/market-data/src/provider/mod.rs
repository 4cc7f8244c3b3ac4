//! Live quote providers.
//!
//! The live tier talks to a metered quote API through the
//! [`LiveQuoteProvider`] trait. [`alpha_vantage`] is the bundled
//! implementation; alternates plug in through the same trait.

pub mod alpha_vantage;
mod traits;

pub use alpha_vantage::AlphaVantageProvider;
pub use traits::{LiveQuoteProvider, QuoteFetchOutcome};
