//! Pipeline assembly.
//!
//! Wires caches, rotator, session pool, fetcher and resolver together
//! from a validated [`PipelineConfig`]. Construction is the only
//! fallible stage; once a [`Pipeline`] exists, every lookup resolves.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::cache::TtlCache;
use crate::config::PipelineConfig;
use crate::credentials::CredentialRotator;
use crate::errors::MarketDataError;
use crate::models::{NavResolution, Resolution};
use crate::provider::{AlphaVantageProvider, LiveQuoteProvider};
use crate::resolver::QuoteResolver;
use crate::scrape::{HttpSessionLauncher, ScrapeFetcher, SessionLauncher, SessionPool};
use crate::sink::{LogSink, QuoteSink};

pub struct Pipeline {
    resolver: Arc<QuoteResolver>,
}

impl Pipeline {
    /// Assemble a pipeline from injected parts.
    ///
    /// Validates the config, launches the session pool eagerly and
    /// warms the cache with any configured symbols before returning.
    pub async fn from_config(
        config: PipelineConfig,
        launcher: Arc<dyn SessionLauncher>,
        provider: Arc<dyn LiveQuoteProvider>,
        sink: Option<Arc<dyn QuoteSink>>,
    ) -> Result<Self, MarketDataError> {
        config.validate()?;

        let pool = Arc::new(SessionPool::initialize(launcher, config.pool.size).await?);
        let fetcher = Arc::new(ScrapeFetcher::new(pool, config.recipes, config.nav_recipes));

        let market_cache = Arc::new(TtlCache::new(
            "market",
            config.cache.market_capacity,
            Duration::from_secs(config.cache.market_ttl_secs),
        ));
        let nav_cache = Arc::new(TtlCache::new(
            "nav",
            config.cache.nav_capacity,
            Duration::from_secs(config.cache.nav_ttl_secs),
        ));
        let rotator = Arc::new(CredentialRotator::new(config.credentials));

        let mut resolver = QuoteResolver::new(
            market_cache,
            nav_cache,
            rotator,
            provider,
            fetcher,
            config.cache.tier_ttls(),
            Duration::from_secs(config.live.timeout_secs),
        );
        if let Some(sink) = sink {
            resolver = resolver.with_sink(sink);
        }
        let resolver = Arc::new(resolver);

        if !config.warm_symbols.is_empty() {
            info!("Warming cache with {} symbols", config.warm_symbols.len());
            resolver.warm(&config.warm_symbols).await;
        }

        Ok(Self { resolver })
    }

    /// Assemble with the bundled parts: HTTP session launcher, Alpha
    /// Vantage live provider and log sink.
    pub async fn standard(config: PipelineConfig) -> Result<Self, MarketDataError> {
        let provider: Arc<dyn LiveQuoteProvider> = match &config.live.base_url {
            Some(base_url) => Arc::new(AlphaVantageProvider::with_base_url(base_url.clone())),
            None => Arc::new(AlphaVantageProvider::new()),
        };

        Self::from_config(
            config,
            Arc::new(HttpSessionLauncher),
            provider,
            Some(Arc::new(LogSink)),
        )
        .await
    }

    pub async fn resolve(&self, symbol: &str) -> Resolution {
        self.resolver.resolve(symbol).await
    }

    pub async fn resolve_nav(&self, isin: &str) -> NavResolution {
        self.resolver.resolve_nav(isin).await
    }

    pub fn invalidate(&self, symbol: &str) -> bool {
        self.resolver.invalidate(symbol)
    }

    pub fn invalidate_nav(&self, isin: &str) -> bool {
        self.resolver.invalidate_nav(isin)
    }

    /// Shared handle for callers that outlive the pipeline value.
    pub fn resolver(&self) -> Arc<QuoteResolver> {
        Arc::clone(&self.resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_startup() {
        let mut config = PipelineConfig::default();
        config.pool.size = 0;

        let result = Pipeline::standard(config).await;
        assert!(matches!(result, Err(MarketDataError::Configuration(_))));
    }
}
