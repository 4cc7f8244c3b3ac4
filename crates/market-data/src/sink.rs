//! Downstream delivery of freshly resolved quotes.
//!
//! The resolver hands every quote it fetched (cache hits excluded) to
//! a [`QuoteSink`] on a detached task, so persistence latency never
//! shows up in resolution latency. Storage backends implement the
//! trait; [`LogSink`] is the bundled no-op that just logs.

use async_trait::async_trait;
use log::debug;

use crate::errors::MarketDataError;
use crate::models::Quote;

/// Receives quotes the pipeline resolved from a non-cache tier.
#[async_trait]
pub trait QuoteSink: Send + Sync {
    async fn persist(&self, quote: &Quote) -> Result<(), MarketDataError>;
}

/// Sink that records deliveries in the log and keeps nothing.
#[derive(Default)]
pub struct LogSink;

#[async_trait]
impl QuoteSink for LogSink {
    async fn persist(&self, quote: &Quote) -> Result<(), MarketDataError> {
        debug!(
            "Sink received {} at {} from tier {}",
            quote.symbol, quote.price, quote.source_tier
        );
        Ok(())
    }
}
