//! Page-source sessions and the launcher that creates them.
//!
//! The pool owns sessions only through these traits, so the HTTP
//! implementation here can be swapped for a driver-backed browser (or
//! a canned fake in tests) without touching pool or fetcher code.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use uuid::Uuid;

use crate::errors::MarketDataError;

/// Desktop Chrome identity presented to scraped sites.
///
/// Quote pages serve a stripped or scripted page to unknown agents,
/// so the session advertises a common browser and viewport.
const USER_AGENT_STRING: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const VIEWPORT_WIDTH: &str = "1920";
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// A live page-fetching session.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Stable identity for log lines.
    fn id(&self) -> Uuid;

    /// Whether the session can still serve fetches.
    async fn is_alive(&self) -> bool;

    /// Fetch the raw HTML of `url`.
    ///
    /// Implementations backed by a remote session should return
    /// [`MarketDataError::SessionDisconnected`] when that session died
    /// mid-request; the recipe walk then moves to its next source.
    async fn fetch_html(&self, url: &str) -> Result<String, MarketDataError>;
}

/// Creates fresh [`PageSource`] sessions for the pool.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageSource>, MarketDataError>;
}

/// Plain-HTTP page source with a browser-like request profile.
pub struct HttpPageSource {
    id: Uuid,
    client: Client,
}

impl HttpPageSource {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            client: build_client(),
        }
    }
}

impl Default for HttpPageSource {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml"),
    );
    headers.insert("viewport-width", HeaderValue::from_static(VIEWPORT_WIDTH));
    headers.insert(
        "sec-ch-viewport-width",
        HeaderValue::from_static(VIEWPORT_WIDTH),
    );

    Client::builder()
        .user_agent(USER_AGENT_STRING)
        .default_headers(headers)
        .timeout(PAGE_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[async_trait]
impl PageSource for HttpPageSource {
    fn id(&self) -> Uuid {
        self.id
    }

    /// An HTTP client holds no remote session to lose, so it only
    /// reports dead once dropped.
    async fn is_alive(&self) -> bool {
        true
    }

    async fn fetch_html(&self, url: &str) -> Result<String, MarketDataError> {
        debug!("Session {}: fetching {}", self.id, url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    source_name: url.to_string(),
                }
            } else {
                MarketDataError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Upstream {
                source_name: url.to_string(),
                message: format!("HTTP {status}"),
            });
        }

        response
            .text()
            .await
            .map_err(MarketDataError::Network)
    }
}

/// Launches [`HttpPageSource`] sessions.
#[derive(Default)]
pub struct HttpSessionLauncher;

#[async_trait]
impl SessionLauncher for HttpSessionLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSource>, MarketDataError> {
        let source = HttpPageSource::new();
        debug!("Launched HTTP page source {}", source.id());
        Ok(Box::new(source))
    }
}
