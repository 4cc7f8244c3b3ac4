//! Relative Strength Index (RSI).
//!
//! One-shot computation over the first `period` deltas:
//! RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS).
//! Edge cases: flat series pins to 50, all-gain to 100, all-loss to 0.

/// RSI over the first `period` close-to-close deltas.
///
/// Returns `None` when fewer than `period + 1` closes exist or
/// `period` is zero.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    Some(strength_index(avg_gain, avg_loss))
}

fn strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
