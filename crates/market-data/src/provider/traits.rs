use async_trait::async_trait;

use crate::credentials::Credential;
use crate::errors::MarketDataError;
use crate::models::Quote;

/// Result of one live-tier fetch attempt.
///
/// Rate limiting is split out from other failures because it drives a
/// different escalation: the resolver rotates to the next credential
/// instead of retrying or leaving the tier. Metered APIs report
/// throttling both as HTTP 429 and as a 200 response whose payload
/// carries a throttle note, so the classification lives with the
/// provider that understands the payload.
#[derive(Debug)]
pub enum QuoteFetchOutcome {
    /// A usable quote.
    Ok(Quote),
    /// The credential used for this attempt is out of quota.
    RateLimited { message: String },
    /// Any other failure, classified for escalation by the resolver.
    Failed(MarketDataError),
}

/// A metered real-time quote API.
#[async_trait]
pub trait LiveQuoteProvider: Send + Sync {
    /// Stable name for logs and attempt traces.
    fn source_name(&self) -> &'static str;

    /// Fetch the latest quote for `symbol` using `credential`.
    async fn fetch_quote(&self, symbol: &str, credential: &Credential) -> QuoteFetchOutcome;
}
