//! Finsense Indicators Crate
//!
//! Technical indicators computed over close-price history.
//!
//! # Overview
//!
//! This crate is pure computation: no I/O, no async, no shared state.
//! Every indicator is a free function over a `&[f64]` slice of closes
//! ordered oldest first, returning `Option<f64>` (or `Option<Macd>`).
//! Short input never panics; it yields `None`.
//!
//! # Core Types
//!
//! - [`HistoricalPoint`] - One day's OHLCV bar
//! - [`PriceHistory`] - Ordered daily series with accessors
//! - [`Macd`] - MACD line, signal, and histogram triple
//! - [`IndicatorSet`] - All indicators at their conventional periods
//!
//! # Conventions
//!
//! - SMA averages the most recent `period` closes.
//! - EMA seeds at the first close and folds across the whole series
//!   with `alpha = 2 / (period + 1)`.
//! - RSI is a one-shot average of the first `period` deltas.
//! - The MACD signal is a 9-period EMA over the running series of
//!   MACD-line values, one per close from the 26th onward.

pub mod ema;
pub mod history;
pub mod macd;
pub mod rsi;
pub mod set;
pub mod sma;

pub use ema::{ema, ema_series};
pub use history::{HistoricalPoint, PriceHistory};
pub use macd::{macd, Macd};
pub use rsi::rsi;
pub use set::{compute_indicators, IndicatorSet};
pub use sma::sma;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;
