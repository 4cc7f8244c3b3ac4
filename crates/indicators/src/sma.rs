//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of the most recent `period` closes.

/// Mean of the last `period` values.
///
/// Returns `None` when fewer than `period` values exist or `period`
/// is zero.
pub fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
