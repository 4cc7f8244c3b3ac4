//! Headless-session scrape tier.
//!
//! Page fetching is split across three layers. [`session`] defines the
//! launcher and page-source traits plus the plain-HTTP implementation.
//! [`pool`] keeps a fixed set of sessions alive behind per-worker
//! mailboxes and replaces the whole set when one dies. [`fetcher`]
//! walks the recipe catalog against the pool and extracts quote
//! fields from the returned HTML.

pub mod fetcher;
pub mod pool;
pub mod session;

pub use fetcher::ScrapeFetcher;
pub use pool::SessionPool;
pub use session::{HttpPageSource, HttpSessionLauncher, PageSource, SessionLauncher};
