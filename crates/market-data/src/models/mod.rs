//! Data models for quotes, recipes, and resolution diagnostics.

mod quote;
mod recipe;
mod resolution;

pub use quote::{FundNav, Quote, SourceTier, ESTIMATED_NOTE};
pub use recipe::{default_nav_recipes, default_recipes, order_recipes, ScrapeRecipe};
pub use resolution::{AttemptLog, AttemptOutcome, AttemptTrace, NavResolution, Resolution};
