//! Recipe-driven price extraction over the session pool.

use std::sync::Arc;

use log::{debug, warn};
use rust_decimal::Decimal;
use scraper::{Html, Selector};

use crate::errors::MarketDataError;
use crate::models::{order_recipes, FundNav, Quote, ScrapeRecipe, SourceTier};
use crate::scrape::pool::SessionPool;

/// Walks an ordered recipe catalog until one recipe yields a price.
pub struct ScrapeFetcher {
    pool: Arc<SessionPool>,
    recipes: Vec<ScrapeRecipe>,
    nav_recipes: Vec<ScrapeRecipe>,
}

impl ScrapeFetcher {
    pub fn new(
        pool: Arc<SessionPool>,
        recipes: Vec<ScrapeRecipe>,
        nav_recipes: Vec<ScrapeRecipe>,
    ) -> Self {
        Self {
            pool,
            recipes: order_recipes(recipes),
            nav_recipes: order_recipes(nav_recipes),
        }
    }

    pub fn has_recipes(&self) -> bool {
        !self.recipes.is_empty()
    }

    pub fn has_nav_recipes(&self) -> bool {
        !self.nav_recipes.is_empty()
    }

    /// Scrape a quote for `symbol`, or `None` when every recipe fails.
    pub async fn scrape(&self, symbol: &str) -> Option<Quote> {
        match self.try_scrape(symbol).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!("Scrape tier failed for {symbol}: {e}");
                None
            }
        }
    }

    /// Scrape a quote for `symbol`, reporting why the walk stopped.
    pub async fn try_scrape(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let extraction = self.walk_recipes(&self.recipes, symbol).await?;
        let mut quote = Quote::new(symbol.to_string(), extraction.price, SourceTier::Scrape);
        quote.change = extraction.change;
        quote.volume = extraction.volume;
        Ok(quote)
    }

    /// Scrape a fund NAV for `isin`, or `None` when every recipe fails.
    pub async fn scrape_nav(&self, isin: &str) -> Option<FundNav> {
        match self.try_scrape_nav(isin).await {
            Ok(nav) => Some(nav),
            Err(e) => {
                warn!("NAV scrape failed for {isin}: {e}");
                None
            }
        }
    }

    pub async fn try_scrape_nav(&self, isin: &str) -> Result<FundNav, MarketDataError> {
        let extraction = self.walk_recipes(&self.nav_recipes, isin).await?;
        Ok(FundNav::new(isin.to_string(), extraction.price, SourceTier::Scrape))
    }

    /// Try each recipe in priority order until one extracts a price.
    ///
    /// A pool-exhaustion error aborts the walk immediately: later
    /// recipes would hit the same dead pool.
    async fn walk_recipes(
        &self,
        recipes: &[ScrapeRecipe],
        symbol: &str,
    ) -> Result<Extraction, MarketDataError> {
        let mut last_error: Option<MarketDataError> = None;

        for recipe in recipes {
            match self.run_recipe(recipe, symbol).await {
                Ok(extraction) => {
                    debug!(
                        "Recipe '{}' extracted {} for {}",
                        recipe.name, extraction.price, symbol
                    );
                    return Ok(extraction);
                }
                Err(e @ MarketDataError::PoolExhausted) => return Err(e),
                Err(e) => {
                    debug!("Recipe '{}' failed for {}: {}", recipe.name, symbol, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            MarketDataError::Configuration("no scrape recipe configured".to_string())
        }))
    }

    async fn run_recipe(
        &self,
        recipe: &ScrapeRecipe,
        symbol: &str,
    ) -> Result<Extraction, MarketDataError> {
        let url = recipe.render_url(symbol);
        let html = self.pool.fetch_html(&url).await?;

        extract_fields(&html, recipe).ok_or_else(|| MarketDataError::ExtractionMismatch {
            source_name: recipe.name.clone(),
            message: format!("selector '{}' matched nothing usable", recipe.selector),
        })
    }
}

/// Cells pulled out of one page. Only the price is mandatory.
struct Extraction {
    price: Decimal,
    change: Option<Decimal>,
    volume: Option<Decimal>,
}

/// Apply a recipe's selector set to `html`. `None` when the price cell
/// is missing or unparseable; change and volume misses leave their
/// fields empty.
///
/// Synchronous on purpose: [`Html`] is not `Send`, so parsing must not
/// live across an await point.
fn extract_fields(html: &str, recipe: &ScrapeRecipe) -> Option<Extraction> {
    let document = Html::parse_document(html);
    let price = select_decimal(&document, &recipe.selector)?;
    let change = recipe
        .change_selector
        .as_deref()
        .and_then(|s| select_decimal(&document, s));
    let volume = recipe
        .volume_selector
        .as_deref()
        .and_then(|s| select_decimal(&document, s));

    Some(Extraction {
        price,
        change,
        volume,
    })
}

/// Parse the first text match of `selector` as a decimal, commas
/// stripped.
fn select_decimal(document: &Html, selector: &str) -> Option<Decimal> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;

    let raw: String = element.text().collect();
    raw.trim().replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::models::{default_nav_recipes, default_recipes};
    use crate::scrape::session::{PageSource, SessionLauncher};

    struct CannedSource {
        id: Uuid,
        html: String,
    }

    #[async_trait]
    impl PageSource for CannedSource {
        fn id(&self) -> Uuid {
            self.id
        }

        async fn is_alive(&self) -> bool {
            true
        }

        async fn fetch_html(&self, _url: &str) -> Result<String, MarketDataError> {
            Ok(self.html.clone())
        }
    }

    struct CannedLauncher {
        html: String,
    }

    #[async_trait]
    impl SessionLauncher for CannedLauncher {
        async fn launch(&self) -> Result<Box<dyn PageSource>, MarketDataError> {
            Ok(Box::new(CannedSource {
                id: Uuid::new_v4(),
                html: self.html.clone(),
            }))
        }
    }

    async fn pool_serving(html: &str) -> Arc<SessionPool> {
        let launcher = Arc::new(CannedLauncher {
            html: html.to_string(),
        });
        Arc::new(SessionPool::initialize(launcher, 1).await.unwrap())
    }

    fn select(html: &str, selector: &str) -> Option<Decimal> {
        select_decimal(&Html::parse_document(html), selector)
    }

    #[test]
    fn test_select_decimal_by_attribute_selector() {
        let html = r#"<html><span data-test="qsp-price">185.42</span></html>"#;
        assert_eq!(select(html, r#"[data-test="qsp-price"]"#), Some(dec!(185.42)));
    }

    #[test]
    fn test_select_decimal_strips_thousands_separators() {
        let html = r#"<div id="nsecp"> 2,456.30 </div>"#;
        assert_eq!(select(html, "#nsecp"), Some(dec!(2456.30)));
    }

    #[test]
    fn test_select_decimal_misses_absent_selector() {
        let html = "<html><body><p>no quotes here</p></body></html>";
        assert_eq!(select(html, "#nsecp"), None);
    }

    #[test]
    fn test_select_decimal_rejects_non_numeric_text() {
        let html = r#"<div id="nsecp">suspended</div>"#;
        assert_eq!(select(html, "#nsecp"), None);
    }

    #[test]
    fn test_select_decimal_tolerates_invalid_selector() {
        assert_eq!(select("<html></html>", "[[["), None);
    }

    #[tokio::test]
    async fn test_scrape_falls_through_to_lower_priority_recipe() {
        // Only the moneycontrol selector is present, so the walk must
        // get past the yahoo recipe first.
        let pool = pool_serving(r#"<div id="nsecp">2,456.30</div>"#).await;
        let fetcher = ScrapeFetcher::new(pool, default_recipes(), Vec::new());

        let quote = fetcher.scrape("RELIANCE").await.unwrap();
        assert_eq!(quote.price, dec!(2456.30));
        assert_eq!(quote.source_tier, SourceTier::Scrape);
        assert_eq!(quote.symbol, "RELIANCE");
    }

    #[tokio::test]
    async fn test_scrape_prefers_highest_priority_recipe() {
        let html = r#"
            <span data-test="qsp-price">185.42</span>
            <div id="nsecp">9999.99</div>
        "#;
        let pool = pool_serving(html).await;
        let fetcher = ScrapeFetcher::new(pool, default_recipes(), Vec::new());

        let quote = fetcher.scrape("IBM").await.unwrap();
        assert_eq!(quote.price, dec!(185.42));
    }

    fn full_recipe() -> ScrapeRecipe {
        ScrapeRecipe {
            name: "full".to_string(),
            url_template: "https://full.example/{symbol}".to_string(),
            selector: ".price".to_string(),
            change_selector: Some(".change".to_string()),
            volume_selector: Some(".volume".to_string()),
            priority: 1,
        }
    }

    #[tokio::test]
    async fn test_scrape_fills_change_and_volume_when_selectors_hit() {
        let html = r#"
            <span class="price">185.42</span>
            <span class="change">-1.25</span>
            <span class="volume">3,456,789</span>
        "#;
        let pool = pool_serving(html).await;
        let fetcher = ScrapeFetcher::new(pool, vec![full_recipe()], Vec::new());

        let quote = fetcher.scrape("IBM").await.unwrap();
        assert_eq!(quote.price, dec!(185.42));
        assert_eq!(quote.change, Some(dec!(-1.25)));
        assert_eq!(quote.volume, Some(dec!(3456789)));
    }

    #[tokio::test]
    async fn test_scrape_survives_missing_change_and_volume_cells() {
        let pool = pool_serving(r#"<span class="price">185.42</span>"#).await;
        let fetcher = ScrapeFetcher::new(pool, vec![full_recipe()], Vec::new());

        let quote = fetcher.scrape("IBM").await.unwrap();
        assert_eq!(quote.price, dec!(185.42));
        assert_eq!(quote.change, None);
        assert_eq!(quote.volume, None);
    }

    #[tokio::test]
    async fn test_scrape_returns_none_when_every_recipe_misses() {
        let pool = pool_serving("<html><body></body></html>").await;
        let fetcher = ScrapeFetcher::new(pool, default_recipes(), Vec::new());

        assert!(fetcher.scrape("IBM").await.is_none());
    }

    #[tokio::test]
    async fn test_try_scrape_reports_extraction_mismatch() {
        let pool = pool_serving("<html><body></body></html>").await;
        let fetcher = ScrapeFetcher::new(pool, default_recipes(), Vec::new());

        let err = fetcher.try_scrape("IBM").await.unwrap_err();
        assert!(matches!(err, MarketDataError::ExtractionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_try_scrape_without_recipes_is_configuration_error() {
        let pool = pool_serving("<html></html>").await;
        let fetcher = ScrapeFetcher::new(pool, Vec::new(), Vec::new());

        assert!(!fetcher.has_recipes());
        let err = fetcher.try_scrape("IBM").await.unwrap_err();
        assert!(matches!(err, MarketDataError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_scrape_nav_uses_nav_catalog() {
        let pool = pool_serving(r#"<span class="fund_NAV">152.8912</span>"#).await;
        let fetcher = ScrapeFetcher::new(pool, default_recipes(), default_nav_recipes());

        let nav = fetcher.scrape_nav("INF109K01Z48").await.unwrap();
        assert_eq!(nav.nav, dec!(152.8912));
        assert_eq!(nav.source_tier, SourceTier::Scrape);
        assert_eq!(nav.isin, "INF109K01Z48");
    }
}
