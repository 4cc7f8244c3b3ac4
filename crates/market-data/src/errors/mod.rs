//! Error types and escalation classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`Escalation`]: Classification for determining fallback behavior

mod escalation;

pub use escalation::Escalation;

use thiserror::Error;

/// Errors that can occur while resolving market data.
///
/// Each variant is classified into an [`Escalation`] via the
/// [`escalation`](Self::escalation) method, which determines how the
/// resolver moves through its tier ladder.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The source throttled the request. For Alpha Vantage this is
    /// usually an HTTP 200 whose body carries a textual note rather
    /// than a 429.
    #[error("Rate limited: {credential}")]
    RateLimited {
        /// Masked credential that was throttled
        credential: String,
    },

    /// The request to the source timed out.
    #[error("Timeout: {source_name}")]
    Timeout {
        /// The source that timed out
        source_name: String,
    },

    /// The source answered but with an error of its own.
    /// Worth one retry with a different credential before moving on.
    #[error("Upstream error: {source_name} - {message}")]
    Upstream {
        /// The source that returned the error
        source_name: String,
        /// The error message from the source
        message: String,
    },

    /// The source answered with a document the recipe or decoder could
    /// not extract a price from. The next source may still succeed.
    #[error("Extraction mismatch: {source_name} - {message}")]
    ExtractionMismatch {
        /// The source or recipe whose extraction failed
        source_name: String,
        /// What went wrong
        message: String,
    },

    /// A scrape session died mid-request.
    #[error("Session disconnected: {session_id}")]
    SessionDisconnected {
        /// Id of the dead session
        session_id: String,
    },

    /// The session pool could not be (re)built. The scrape tier is
    /// unusable until the next resolution attempt.
    #[error("Session pool exhausted")]
    PoolExhausted,

    /// The pipeline configuration is invalid.
    /// This is surfaced at startup, never during resolution.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A network error occurred while communicating with a source.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the escalation classification for this error.
    ///
    /// This classification determines how the resolver reacts:
    ///
    /// - [`Escalation::RotateCredential`]: Try the next credential
    /// - [`Escalation::RetryOnce`]: One more attempt, then abandon the tier
    /// - [`Escalation::NextSource`]: Move to the next source or recipe
    /// - [`Escalation::SkipTier`]: Fall through to the next tier
    /// - [`Escalation::Fatal`]: Surface at startup, never during resolution
    ///
    /// # Examples
    ///
    /// ```
    /// use finsense_market_data::errors::{Escalation, MarketDataError};
    ///
    /// let error = MarketDataError::RateLimited { credential: "abcd...".to_string() };
    /// assert_eq!(error.escalation(), Escalation::RotateCredential);
    ///
    /// let error = MarketDataError::PoolExhausted;
    /// assert_eq!(error.escalation(), Escalation::SkipTier);
    /// ```
    pub fn escalation(&self) -> Escalation {
        match self {
            // Throttled: the next credential may still be under quota
            Self::RateLimited { .. } => Escalation::RotateCredential,

            // Transient transport failures - retry once, then move on
            Self::Timeout { .. } | Self::Upstream { .. } | Self::Network(_) => {
                Escalation::RetryOnce
            }

            // This source can't serve the symbol, another might
            Self::ExtractionMismatch { .. } | Self::SessionDisconnected { .. } => {
                Escalation::NextSource
            }

            // Whole tier unusable
            Self::PoolExhausted => Escalation::SkipTier,

            // Broken configuration - terminal
            Self::Configuration(_) => Escalation::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_rotates_credential() {
        let error = MarketDataError::RateLimited {
            credential: "abcd...".to_string(),
        };
        assert_eq!(error.escalation(), Escalation::RotateCredential);
    }

    #[test]
    fn test_timeout_retries_once() {
        let error = MarketDataError::Timeout {
            source_name: "ALPHA_VANTAGE".to_string(),
        };
        assert_eq!(error.escalation(), Escalation::RetryOnce);
    }

    #[test]
    fn test_upstream_retries_once() {
        let error = MarketDataError::Upstream {
            source_name: "ALPHA_VANTAGE".to_string(),
            message: "Internal server error".to_string(),
        };
        assert_eq!(error.escalation(), Escalation::RetryOnce);
    }

    #[test]
    fn test_extraction_mismatch_tries_next_source() {
        let error = MarketDataError::ExtractionMismatch {
            source_name: "yahoo-finance".to_string(),
            message: "selector matched nothing".to_string(),
        };
        assert_eq!(error.escalation(), Escalation::NextSource);
    }

    #[test]
    fn test_session_disconnected_tries_next_source() {
        let error = MarketDataError::SessionDisconnected {
            session_id: "3fa85f64".to_string(),
        };
        assert_eq!(error.escalation(), Escalation::NextSource);
    }

    #[test]
    fn test_pool_exhausted_skips_tier() {
        let error = MarketDataError::PoolExhausted;
        assert_eq!(error.escalation(), Escalation::SkipTier);
    }

    #[test]
    fn test_configuration_is_fatal() {
        let error = MarketDataError::Configuration("pool size must be nonzero".to_string());
        assert_eq!(error.escalation(), Escalation::Fatal);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::RateLimited {
            credential: "abcd...".to_string(),
        };
        assert_eq!(format!("{}", error), "Rate limited: abcd...");

        let error = MarketDataError::Upstream {
            source_name: "ALPHA_VANTAGE".to_string(),
            message: "API key invalid".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Upstream error: ALPHA_VANTAGE - API key invalid"
        );

        let error = MarketDataError::PoolExhausted;
        assert_eq!(format!("{}", error), "Session pool exhausted");
    }
}
