//! Market data acquisition with tiered fallback.
//!
//! Quote resolution walks a fixed ladder: a TTL cache, a metered live
//! API behind rotating credentials, a recipe-driven scrape of public
//! quote pages, and finally a synthesized estimate. The ladder never
//! fails, it degrades: callers always get a value, and the returned
//! resolution says which tier produced it and what every consulted
//! tier reported. Values are written back to the cache with a TTL
//! chosen by the producing tier, so degraded data expires quickly
//! while live data lingers.
//!
//! [`Pipeline`] assembles the whole stack from a [`PipelineConfig`].
//! The parts underneath are public for callers that wire their own
//! providers, page sources or sinks.

pub mod cache;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod resolver;
pub mod scrape;
pub mod sink;

pub use cache::TtlCache;
pub use config::{PipelineConfig, TierTtls};
pub use credentials::{Credential, CredentialRotator, CredentialStatus};
pub use errors::{Escalation, MarketDataError};
pub use models::{
    AttemptOutcome, AttemptTrace, FundNav, NavResolution, Quote, Resolution, ScrapeRecipe,
    SourceTier, ESTIMATED_NOTE,
};
pub use pipeline::Pipeline;
pub use provider::{AlphaVantageProvider, LiveQuoteProvider, QuoteFetchOutcome};
pub use resolver::QuoteResolver;
pub use scrape::{ScrapeFetcher, SessionLauncher, SessionPool};
pub use sink::{LogSink, QuoteSink};
