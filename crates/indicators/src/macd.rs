//! Moving Average Convergence Divergence (MACD).
//!
//! line = EMA(12) - EMA(26); signal = EMA(9) of the line series;
//! histogram = line - signal. The signal folds over the full run of
//! line values, one per close from the 26th onward, never over a
//! single point.

use serde::{Deserialize, Serialize};

use crate::ema::ema_series;

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;

/// MACD triple at the most recent close.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD over `closes` at the standard 12/26/9 periods.
///
/// Returns `None` when fewer than 26 closes exist.
pub fn macd(closes: &[f64]) -> Option<Macd> {
    if closes.len() < SLOW_PERIOD {
        return None;
    }

    let fast = ema_series(closes, FAST_PERIOD);
    let slow = ema_series(closes, SLOW_PERIOD);

    // One line value per close from index SLOW_PERIOD - 1 onward.
    let line_series: Vec<f64> = fast
        .iter()
        .zip(&slow)
        .skip(SLOW_PERIOD - 1)
        .map(|(f, s)| f - s)
        .collect();

    let line = *line_series.last()?;
    let signal = *ema_series(&line_series, SIGNAL_PERIOD).last()?;

    Some(Macd {
        line,
        signal,
        histogram: line - signal,
    })
}
