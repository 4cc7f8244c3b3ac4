//! Tier-ladder quote resolution.
//!
//! A lookup walks Cache, Live, Scrape, Estimated in that order and
//! always produces a quote: the estimated tier is infallible by
//! construction. Every tier consulted leaves an attempt trace on the
//! returned [`Resolution`], and quotes produced by a non-cache tier
//! are written back to the cache with a TTL chosen by the tier that
//! produced them.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::timeout;

use crate::cache::TtlCache;
use crate::config::TierTtls;
use crate::credentials::{mask_key, CredentialRotator};
use crate::errors::{Escalation, MarketDataError};
use crate::models::{AttemptLog, FundNav, NavResolution, Quote, Resolution, SourceTier};
use crate::provider::{LiveQuoteProvider, QuoteFetchOutcome};
use crate::scrape::ScrapeFetcher;
use crate::sink::QuoteSink;

/// Uppercase, trimmed form used as the cache key and upstream symbol.
fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

pub struct QuoteResolver {
    market_cache: Arc<TtlCache<Quote>>,
    nav_cache: Arc<TtlCache<FundNav>>,
    rotator: Arc<CredentialRotator>,
    provider: Arc<dyn LiveQuoteProvider>,
    fetcher: Arc<ScrapeFetcher>,
    sink: Option<Arc<dyn QuoteSink>>,
    ttls: TierTtls,
    live_timeout: Duration,
}

impl QuoteResolver {
    pub fn new(
        market_cache: Arc<TtlCache<Quote>>,
        nav_cache: Arc<TtlCache<FundNav>>,
        rotator: Arc<CredentialRotator>,
        provider: Arc<dyn LiveQuoteProvider>,
        fetcher: Arc<ScrapeFetcher>,
        ttls: TierTtls,
        live_timeout: Duration,
    ) -> Self {
        Self {
            market_cache,
            nav_cache,
            rotator,
            provider,
            fetcher,
            sink: None,
            ttls,
            live_timeout,
        }
    }

    /// Attach a sink that receives every freshly fetched quote.
    pub fn with_sink(mut self, sink: Arc<dyn QuoteSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Resolve `symbol` down the tier ladder. Never fails.
    ///
    /// A cache hit is returned verbatim: the stored quote keeps the
    /// tier and note of whichever tier originally produced it, while
    /// [`Resolution::served_from`] reports `Cache` as the serving
    /// path.
    pub async fn resolve(&self, symbol: &str) -> Resolution {
        let symbol = normalize_symbol(symbol);
        let mut log = AttemptLog::new();

        if let Some(quote) = self.market_cache.get(&symbol) {
            debug!("Cache hit for {symbol}");
            log.record_success(SourceTier::Cache, "fresh entry");
            return Resolution {
                quote,
                served_from: SourceTier::Cache,
                attempts: log.into_attempts(),
            };
        }
        log.record_failure(SourceTier::Cache, "miss");

        if let Some(quote) = self.live_tier(&symbol, &mut log).await {
            return self.finish(&symbol, quote, self.ttls.live, log);
        }

        if self.fetcher.has_recipes() {
            match self.fetcher.try_scrape(&symbol).await {
                Ok(quote) => {
                    log.record_success(SourceTier::Scrape, "recipe walk");
                    return self.finish(&symbol, quote, self.ttls.scrape, log);
                }
                Err(e) => {
                    warn!("Scrape tier failed for {symbol}: {e}");
                    log.record_failure(SourceTier::Scrape, &e.to_string());
                }
            }
        } else {
            log.record_skip(SourceTier::Scrape, "no recipes configured");
        }

        info!(
            "Synthesizing estimated quote for {symbol}; attempts: {}",
            log.summary()
        );
        let quote = Quote::estimated(&symbol);
        log.record_success(SourceTier::Estimated, "synthesized");
        self.finish(&symbol, quote, self.ttls.estimated, log)
    }

    /// Resolve a fund NAV by ISIN. Never fails.
    ///
    /// NAVs have no live API tier; the ladder is Cache, Scrape,
    /// Estimated.
    pub async fn resolve_nav(&self, isin: &str) -> NavResolution {
        let isin = normalize_symbol(isin);
        let mut log = AttemptLog::new();

        if let Some(nav) = self.nav_cache.get(&isin) {
            debug!("NAV cache hit for {isin}");
            log.record_success(SourceTier::Cache, "fresh entry");
            return NavResolution {
                nav,
                served_from: SourceTier::Cache,
                attempts: log.into_attempts(),
            };
        }
        log.record_failure(SourceTier::Cache, "miss");

        if self.fetcher.has_nav_recipes() {
            match self.fetcher.try_scrape_nav(&isin).await {
                Ok(nav) => {
                    log.record_success(SourceTier::Scrape, "recipe walk");
                    self.nav_cache.insert_with_ttl(&isin, nav.clone(), self.ttls.nav);
                    return NavResolution {
                        nav,
                        served_from: SourceTier::Scrape,
                        attempts: log.into_attempts(),
                    };
                }
                Err(e) => {
                    warn!("NAV scrape failed for {isin}: {e}");
                    log.record_failure(SourceTier::Scrape, &e.to_string());
                }
            }
        } else {
            log.record_skip(SourceTier::Scrape, "no NAV recipes configured");
        }

        info!(
            "Synthesizing estimated NAV for {isin}; attempts: {}",
            log.summary()
        );
        let nav = FundNav::estimated(&isin);
        log.record_success(SourceTier::Estimated, "synthesized");
        self.nav_cache
            .insert_with_ttl(&isin, nav.clone(), self.ttls.estimated);
        NavResolution {
            nav,
            served_from: SourceTier::Estimated,
            attempts: log.into_attempts(),
        }
    }

    /// Drop the cached quote for `symbol`, forcing the next resolve to
    /// fetch. Returns whether an entry was present.
    pub fn invalidate(&self, symbol: &str) -> bool {
        self.market_cache.remove(&normalize_symbol(symbol))
    }

    pub fn invalidate_nav(&self, isin: &str) -> bool {
        self.nav_cache.remove(&normalize_symbol(isin))
    }

    /// Resolve each symbol in turn so later lookups start warm.
    ///
    /// Estimated results warm the cache too, at their short TTL, so a
    /// fully degraded startup still answers quickly and retries soon.
    pub async fn warm(&self, symbols: &[String]) {
        for symbol in symbols {
            let resolution = self.resolve(symbol).await;
            debug!(
                "Warmed {} from tier {}",
                resolution.quote.symbol, resolution.served_from
            );
        }
    }

    /// Run the live tier within its rotation budget.
    ///
    /// The budget allows at most one attempt per credential plus one
    /// retry: rate limits rotate to the next credential until every
    /// credential has declined, while a second hard error abandons the
    /// tier rather than hammering a broken upstream.
    async fn live_tier(&self, symbol: &str, log: &mut AttemptLog) -> Option<Quote> {
        let rotations = self.rotator.len();
        if rotations == 0 {
            log.record_skip(SourceTier::Live, "no credentials configured");
            return None;
        }

        let mut rate_limited_seen = 0usize;
        let mut hard_errors = 0usize;

        for _ in 0..=rotations {
            let Some(credential) = self.rotator.next() else {
                break;
            };
            let masked = mask_key(&credential.api_key);

            let fetch = self.provider.fetch_quote(symbol, &credential);
            let outcome = match timeout(self.live_timeout, fetch).await {
                Ok(outcome) => outcome,
                Err(_) => QuoteFetchOutcome::Failed(MarketDataError::Timeout {
                    source_name: self.provider.source_name().to_string(),
                }),
            };

            match outcome {
                QuoteFetchOutcome::Ok(quote) => {
                    log.record_success(SourceTier::Live, &format!("credential {masked}"));
                    return Some(quote);
                }
                QuoteFetchOutcome::RateLimited { message } => {
                    debug!("Credential {masked} rate limited: {message}");
                    self.rotator.note_rate_limit(&credential.api_key);
                    log.record_rate_limited(SourceTier::Live, &format!("credential {masked}"));
                    rate_limited_seen += 1;
                    if rate_limited_seen >= rotations {
                        warn!("Live tier exhausted for {symbol}: all {rotations} credentials rate limited");
                        return None;
                    }
                }
                QuoteFetchOutcome::Failed(e) => {
                    log.record_failure(SourceTier::Live, &e.to_string());
                    match e.escalation() {
                        Escalation::RotateCredential => {
                            rate_limited_seen += 1;
                            if rate_limited_seen >= rotations {
                                warn!("Live tier exhausted for {symbol}: all {rotations} credentials declined");
                                return None;
                            }
                        }
                        Escalation::RetryOnce => {
                            hard_errors += 1;
                            if hard_errors > 1 {
                                warn!("Live tier abandoned for {symbol} after repeated errors: {e}");
                                return None;
                            }
                        }
                        Escalation::NextSource | Escalation::SkipTier | Escalation::Fatal => {
                            warn!("Live tier abandoned for {symbol}: {e}");
                            return None;
                        }
                    }
                }
            }
        }

        None
    }

    /// Write back, hand off to the sink, and build the resolution.
    fn finish(&self, symbol: &str, quote: Quote, ttl: Duration, log: AttemptLog) -> Resolution {
        self.market_cache.insert_with_ttl(symbol, quote.clone(), ttl);
        self.dispatch_sink(quote.clone());

        let served_from = quote.source_tier;
        Resolution {
            quote,
            served_from,
            attempts: log.into_attempts(),
        }
    }

    /// Fire-and-forget delivery so sink latency stays off the resolve
    /// path.
    fn dispatch_sink(&self, quote: Quote) {
        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            tokio::spawn(async move {
                if let Err(e) = sink.persist(&quote).await {
                    warn!("Quote sink rejected {}: {}", quote.symbol, e);
                }
            });
        }
    }
}
