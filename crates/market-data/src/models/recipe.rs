use serde::{Deserialize, Serialize};

/// One extraction rule for the scrape tier.
///
/// The runner renders `url_template` (a `{symbol}` placeholder), pulls
/// the document through the session pool, and parses the first text
/// match of `selector` as a price. The change and volume selectors are
/// best-effort: a miss there leaves the field empty without failing
/// the recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRecipe {
    /// Short identifier used in logs and error contexts
    pub name: String,

    /// URL with a `{symbol}` placeholder
    pub url_template: String,

    /// CSS selector for the price element
    pub selector: String,

    /// CSS selector for the day's change, if the page has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_selector: Option<String>,

    /// CSS selector for the traded volume, if the page has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_selector: Option<String>,

    /// Walk order; lower runs first
    pub priority: u32,
}

impl ScrapeRecipe {
    /// Render the URL for `symbol`, percent-encoding it.
    pub fn render_url(&self, symbol: &str) -> String {
        self.url_template
            .replace("{symbol}", &urlencoding::encode(symbol))
    }
}

/// Put recipes in walk order: ascending priority, ties broken by name
/// so the order is total.
pub fn order_recipes(mut recipes: Vec<ScrapeRecipe>) -> Vec<ScrapeRecipe> {
    recipes.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
    recipes
}

/// Built-in quote recipes, in priority order.
pub fn default_recipes() -> Vec<ScrapeRecipe> {
    vec![
        ScrapeRecipe {
            name: "yahoo-finance".to_string(),
            url_template: "https://finance.yahoo.com/quote/{symbol}".to_string(),
            selector: "[data-test=\"qsp-price\"]".to_string(),
            change_selector: None,
            volume_selector: None,
            priority: 1,
        },
        ScrapeRecipe {
            name: "moneycontrol".to_string(),
            url_template: "https://www.moneycontrol.com/india/stockpricequote/{symbol}".to_string(),
            selector: "#nsecp".to_string(),
            change_selector: None,
            volume_selector: None,
            priority: 2,
        },
    ]
}

/// Built-in fund NAV recipes.
pub fn default_nav_recipes() -> Vec<ScrapeRecipe> {
    vec![ScrapeRecipe {
        name: "moneycontrol-nav".to_string(),
        url_template: "https://www.moneycontrol.com/mutual-funds/{symbol}".to_string(),
        selector: ".fund_NAV".to_string(),
        change_selector: None,
        volume_selector: None,
        priority: 1,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(name: &str, priority: u32) -> ScrapeRecipe {
        ScrapeRecipe {
            name: name.to_string(),
            url_template: format!("https://{name}.example/{{symbol}}"),
            selector: ".price".to_string(),
            change_selector: None,
            volume_selector: None,
            priority,
        }
    }

    #[test]
    fn test_render_url_substitutes_symbol() {
        let r = recipe("alpha", 1);
        assert_eq!(r.render_url("AAPL"), "https://alpha.example/AAPL");
    }

    #[test]
    fn test_render_url_encodes_symbol() {
        let r = recipe("alpha", 1);
        assert_eq!(r.render_url("BRK.A/X"), "https://alpha.example/BRK.A%2FX");
    }

    #[test]
    fn test_order_recipes_by_priority() {
        let ordered = order_recipes(vec![recipe("b", 3), recipe("a", 1), recipe("c", 2)]);
        let names: Vec<&str> = ordered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_order_recipes_breaks_ties_by_name() {
        let ordered = order_recipes(vec![recipe("zeta", 1), recipe("alpha", 1)]);
        let names: Vec<&str> = ordered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_default_recipes_are_ordered() {
        let recipes = default_recipes();
        assert_eq!(recipes[0].name, "yahoo-finance");
        assert!(recipes.windows(2).all(|w| w[0].priority <= w[1].priority));
    }
}
