//! Alpha Vantage GLOBAL_QUOTE client.
//!
//! The free tier meters per key, and throttling shows up two ways: an
//! HTTP 429, or a 200 whose JSON body replaces the quote with a "Note"
//! or "Information" text about call frequency. Both are classified as
//! [`QuoteFetchOutcome::RateLimited`] so the resolver rotates
//! credentials instead of burning its retry on a response that will
//! not improve.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::credentials::{mask_key, Credential};
use crate::errors::MarketDataError;
use crate::models::{Quote, SourceTier};
use crate::provider::traits::{LiveQuoteProvider, QuoteFetchOutcome};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const SOURCE_NAME: &str = "ALPHA_VANTAGE";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Substrings that mark a 200 response as a throttle notice.
const THROTTLE_MARKERS: [&str; 2] = ["api call frequency", "rate limit"];

#[derive(Debug, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

pub struct AlphaVantageProvider {
    client: Client,
    base_url: String,
}

impl AlphaVantageProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at a different endpoint, e.g. a local stub.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for AlphaVantageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiveQuoteProvider for AlphaVantageProvider {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_quote(&self, symbol: &str, credential: &Credential) -> QuoteFetchOutcome {
        let url = format!(
            "{}?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            self.base_url,
            urlencoding::encode(symbol),
            credential.api_key
        );

        debug!(
            "{}: requesting {} with credential {}",
            SOURCE_NAME,
            symbol,
            mask_key(&credential.api_key)
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return QuoteFetchOutcome::Failed(MarketDataError::Timeout {
                    source_name: SOURCE_NAME.to_string(),
                });
            }
            Err(e) => return QuoteFetchOutcome::Failed(MarketDataError::Network(e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return QuoteFetchOutcome::RateLimited {
                message: format!("HTTP 429 from {SOURCE_NAME}"),
            };
        }
        if !status.is_success() {
            return QuoteFetchOutcome::Failed(MarketDataError::Upstream {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status}"),
            });
        }

        let envelope: GlobalQuoteEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                return QuoteFetchOutcome::Failed(MarketDataError::ExtractionMismatch {
                    source_name: SOURCE_NAME.to_string(),
                    message: format!("unparseable response body: {e}"),
                });
            }
        };

        classify_envelope(symbol, envelope)
    }
}

/// Turn a decoded 200 response into a fetch outcome.
///
/// Checked in order: throttle notice, explicit error message, then the
/// quote payload itself. An envelope with none of the three is an
/// extraction mismatch rather than an upstream error, since the API
/// answered but not in the shape we understand.
fn classify_envelope(symbol: &str, envelope: GlobalQuoteEnvelope) -> QuoteFetchOutcome {
    if let Some(message) = throttle_note(&envelope) {
        return QuoteFetchOutcome::RateLimited {
            message: message.to_string(),
        };
    }

    if let Some(message) = envelope.error_message {
        return QuoteFetchOutcome::Failed(MarketDataError::Upstream {
            source_name: SOURCE_NAME.to_string(),
            message,
        });
    }

    if let Some(note) = envelope.note.as_deref().or(envelope.information.as_deref()) {
        warn!("{SOURCE_NAME}: note in response for {symbol}: {note}");
    }

    match envelope.global_quote {
        Some(payload) => match quote_from_payload(symbol, payload) {
            Ok(quote) => QuoteFetchOutcome::Ok(quote),
            Err(e) => QuoteFetchOutcome::Failed(e),
        },
        None => QuoteFetchOutcome::Failed(MarketDataError::ExtractionMismatch {
            source_name: SOURCE_NAME.to_string(),
            message: "response carried no quote payload".to_string(),
        }),
    }
}

fn throttle_note(envelope: &GlobalQuoteEnvelope) -> Option<&str> {
    [envelope.note.as_deref(), envelope.information.as_deref()]
        .into_iter()
        .flatten()
        .find(|text| {
            let lowered = text.to_lowercase();
            THROTTLE_MARKERS.iter().any(|marker| lowered.contains(marker))
        })
}

fn quote_from_payload(requested: &str, payload: GlobalQuote) -> Result<Quote, MarketDataError> {
    let price = payload
        .price
        .as_deref()
        .and_then(parse_decimal)
        .ok_or_else(|| MarketDataError::ExtractionMismatch {
            source_name: SOURCE_NAME.to_string(),
            message: format!("missing or unparseable price for {requested}"),
        })?;

    let symbol = payload
        .symbol
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| requested.to_string());

    let mut quote = Quote::new(symbol, price, SourceTier::Live);
    quote.change = payload.change.as_deref().and_then(parse_decimal);
    quote.change_percent = payload.change_percent.as_deref().and_then(parse_percent);
    quote.volume = payload.volume.as_deref().and_then(parse_decimal);
    Ok(quote)
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    raw.trim().parse().ok()
}

/// Parse a percentage like "0.6678%" into its numeric part.
fn parse_percent(raw: &str) -> Option<Decimal> {
    raw.trim().trim_end_matches('%').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const QUOTE_BODY: &str = r#"{
        "Global Quote": {
            "01. symbol": "IBM",
            "02. open": "184.0000",
            "05. price": "185.4200",
            "06. volume": "3489715",
            "09. change": "1.2300",
            "10. change percent": "0.6678%"
        }
    }"#;

    fn parse(body: &str) -> GlobalQuoteEnvelope {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_full_payload_becomes_live_quote() {
        let outcome = classify_envelope("IBM", parse(QUOTE_BODY));
        match outcome {
            QuoteFetchOutcome::Ok(quote) => {
                assert_eq!(quote.symbol, "IBM");
                assert_eq!(quote.price, dec!(185.42));
                assert_eq!(quote.change, Some(dec!(1.23)));
                assert_eq!(quote.change_percent, Some(dec!(0.6678)));
                assert_eq!(quote.volume, Some(dec!(3489715)));
                assert_eq!(quote.source_tier, SourceTier::Live);
                assert!(quote.note.is_none());
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn test_throttle_note_is_rate_limited() {
        let body = r#"{
            "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 25 requests per day."
        }"#;
        let outcome = classify_envelope("IBM", parse(body));
        match outcome {
            QuoteFetchOutcome::RateLimited { message } => {
                assert!(message.contains("call frequency"));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn test_throttle_in_information_field_is_rate_limited() {
        let body = r#"{
            "Information": "You have reached the rate limit for your free API key."
        }"#;
        let outcome = classify_envelope("IBM", parse(body));
        assert!(matches!(outcome, QuoteFetchOutcome::RateLimited { .. }));
    }

    #[test]
    fn test_unrelated_note_does_not_block_the_quote() {
        let body = r#"{
            "Note": "End of day data is refreshed at market close.",
            "Global Quote": {
                "01. symbol": "IBM",
                "05. price": "185.4200"
            }
        }"#;
        let outcome = classify_envelope("IBM", parse(body));
        assert!(matches!(outcome, QuoteFetchOutcome::Ok(_)));
    }

    #[test]
    fn test_error_message_is_upstream_failure() {
        let body = r#"{
            "Error Message": "Invalid API call. Please retry or visit the documentation."
        }"#;
        let outcome = classify_envelope("BOGUS", parse(body));
        match outcome {
            QuoteFetchOutcome::Failed(MarketDataError::Upstream { source_name, message }) => {
                assert_eq!(source_name, SOURCE_NAME);
                assert!(message.contains("Invalid API call"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_envelope_is_extraction_mismatch() {
        let outcome = classify_envelope("IBM", parse("{}"));
        assert!(matches!(
            outcome,
            QuoteFetchOutcome::Failed(MarketDataError::ExtractionMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_price_is_extraction_mismatch() {
        let body = r#"{
            "Global Quote": {
                "01. symbol": "IBM",
                "06. volume": "3489715"
            }
        }"#;
        let outcome = classify_envelope("IBM", parse(body));
        assert!(matches!(
            outcome,
            QuoteFetchOutcome::Failed(MarketDataError::ExtractionMismatch { .. })
        ));
    }

    #[test]
    fn test_blank_payload_symbol_falls_back_to_requested() {
        let body = r#"{
            "Global Quote": {
                "01. symbol": "",
                "05. price": "42.0000"
            }
        }"#;
        match classify_envelope("RELIANCE.BSE", parse(body)) {
            QuoteFetchOutcome::Ok(quote) => assert_eq!(quote.symbol, "RELIANCE.BSE"),
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_percent_strips_suffix() {
        assert_eq!(parse_percent("0.6678%"), Some(dec!(0.6678)));
        assert_eq!(parse_percent("-1.25%"), Some(dec!(-1.25)));
        assert_eq!(parse_percent("n/a"), None);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(parse_decimal(" 185.42 "), Some(dec!(185.42)));
        assert_eq!(parse_decimal("None"), None);
    }
}
