//! Pipeline configuration.
//!
//! All settings deserialize with serde and every field has a default,
//! so an empty `{}` document yields a working pipeline (no
//! credentials, bundled recipe catalogs). [`PipelineConfig::validate`]
//! rejects states that would only fail later at runtime.

use std::collections::HashSet;
use std::time::Duration;

use scraper::Selector;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{default_nav_recipes, default_recipes, ScrapeRecipe};

pub const DEFAULT_MARKET_CAPACITY: usize = 100;
pub const DEFAULT_NAV_CAPACITY: usize = 50;
pub const DEFAULT_MARKET_TTL_SECS: u64 = 900;
pub const DEFAULT_NAV_TTL_SECS: u64 = 1800;
pub const DEFAULT_SCRAPE_TTL_SECS: u64 = 600;
pub const DEFAULT_ESTIMATED_TTL_SECS: u64 = 120;
pub const DEFAULT_POOL_SIZE: usize = 3;
pub const DEFAULT_LIVE_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Live-tier API keys, rotated round-robin. Empty skips the tier.
    pub credentials: Vec<String>,
    pub cache: CacheConfig,
    pub pool: PoolConfig,
    pub live: LiveConfig,
    pub recipes: Vec<ScrapeRecipe>,
    pub nav_recipes: Vec<ScrapeRecipe>,
    /// Symbols resolved once at startup to pre-fill the cache.
    pub warm_symbols: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            cache: CacheConfig::default(),
            pool: PoolConfig::default(),
            live: LiveConfig::default(),
            recipes: default_recipes(),
            nav_recipes: default_nav_recipes(),
            warm_symbols: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), MarketDataError> {
        if self.credentials.is_empty() && self.recipes.is_empty() {
            return Err(MarketDataError::Configuration(
                "no credentials and no scrape recipes configured".to_string(),
            ));
        }
        if self.cache.market_capacity == 0 {
            return Err(MarketDataError::Configuration(
                "cache.market_capacity must be at least 1".to_string(),
            ));
        }
        if self.cache.nav_capacity == 0 {
            return Err(MarketDataError::Configuration(
                "cache.nav_capacity must be at least 1".to_string(),
            ));
        }
        if self.pool.size == 0 {
            return Err(MarketDataError::Configuration(
                "pool.size must be at least 1".to_string(),
            ));
        }
        if self.live.timeout_secs == 0 {
            return Err(MarketDataError::Configuration(
                "live.timeout_secs must be at least 1".to_string(),
            ));
        }
        validate_recipes("recipes", &self.recipes)?;
        validate_recipes("nav_recipes", &self.nav_recipes)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub market_capacity: usize,
    pub nav_capacity: usize,
    /// TTL for quotes the live tier produced.
    pub market_ttl_secs: u64,
    /// TTL for NAVs the scrape tier produced.
    pub nav_ttl_secs: u64,
    /// TTL for quotes the scrape tier produced.
    pub scrape_ttl_secs: u64,
    /// TTL for synthesized values. Short so a real fetch retries soon.
    pub estimated_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            market_capacity: DEFAULT_MARKET_CAPACITY,
            nav_capacity: DEFAULT_NAV_CAPACITY,
            market_ttl_secs: DEFAULT_MARKET_TTL_SECS,
            nav_ttl_secs: DEFAULT_NAV_TTL_SECS,
            scrape_ttl_secs: DEFAULT_SCRAPE_TTL_SECS,
            estimated_ttl_secs: DEFAULT_ESTIMATED_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn tier_ttls(&self) -> TierTtls {
        TierTtls {
            live: Duration::from_secs(self.market_ttl_secs),
            scrape: Duration::from_secs(self.scrape_ttl_secs),
            estimated: Duration::from_secs(self.estimated_ttl_secs),
            nav: Duration::from_secs(self.nav_ttl_secs),
        }
    }
}

/// Write-back TTL per producing tier.
#[derive(Clone, Copy, Debug)]
pub struct TierTtls {
    pub live: Duration,
    pub scrape: Duration,
    pub estimated: Duration,
    pub nav: Duration,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Outer deadline on one live-tier attempt.
    pub timeout_secs: u64,
    /// Override of the provider endpoint, mainly for test stubs.
    pub base_url: Option<String>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_LIVE_TIMEOUT_SECS,
            base_url: None,
        }
    }
}

fn validate_recipes(field: &str, recipes: &[ScrapeRecipe]) -> Result<(), MarketDataError> {
    let mut names = HashSet::new();
    for recipe in recipes {
        if !names.insert(recipe.name.as_str()) {
            return Err(MarketDataError::Configuration(format!(
                "{field}: duplicate recipe name '{}'",
                recipe.name
            )));
        }
        let selectors = [
            Some(recipe.selector.as_str()),
            recipe.change_selector.as_deref(),
            recipe.volume_selector.as_deref(),
        ];
        for selector in selectors.into_iter().flatten() {
            if Selector::parse(selector).is_err() {
                return Err(MarketDataError::Configuration(format!(
                    "{field}: recipe '{}' has unparseable selector '{selector}'",
                    recipe.name
                )));
            }
        }
    }
    Ok(())
}
