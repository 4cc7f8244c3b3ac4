//! Exponential Moving Average (EMA).
//!
//! Seeded at the first close and folded across the entire series:
//! EMA[0] = close[0]; EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1]
//! with alpha = 2 / (period + 1).

/// Final EMA value over `closes`.
///
/// Returns `None` when fewer than `period` values exist or `period`
/// is zero. Deterministic: identical input bits produce identical
/// output bits.
pub fn ema(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    ema_series(closes, period).last().copied()
}

/// Running EMA at every index: element `i` is the EMA of `closes[..=i]`.
///
/// The minimum-length gate lives in [`ema`]; this fold is defined for
/// any non-empty input, which is what composed indicators need.
pub fn ema_series(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }

    let Some((&first, rest)) = closes.split_first() else {
        return Vec::new();
    };

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(closes.len());
    let mut prev = first;
    out.push(prev);

    for &close in rest {
        prev = alpha * close + (1.0 - alpha) * prev;
        out.push(prev);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_seeds_at_first_close() {
        // alpha = 2/3
        // EMA[0] = 10
        // EMA[1] = (2/3)*11 + (1/3)*10 = 32/3
        // EMA[2] = (2/3)*12 + (1/3)*(32/3) = 104/9
        let result = ema(&[10.0, 11.0, 12.0], 2).unwrap();
        assert_approx(result, 104.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_period_one_tracks_last_close() {
        // alpha = 1: each step replaces the running value
        assert_eq!(ema(&[10.0, 20.0, 30.0], 1), Some(30.0));
    }

    #[test]
    fn ema_single_close_at_exact_length() {
        assert_eq!(ema(&[42.0], 1), Some(42.0));
    }

    #[test]
    fn ema_short_input_is_none() {
        assert_eq!(ema(&[1.0, 2.0], 3), None);
        assert_eq!(ema(&[], 1), None);
    }

    #[test]
    fn ema_zero_period_is_none() {
        assert_eq!(ema(&[1.0, 2.0, 3.0], 0), None);
    }

    #[test]
    fn ema_is_bit_identical_across_runs() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64) * 0.37).collect();
        let a = ema(&closes, 20).unwrap();
        let b = ema(&closes, 20).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn ema_series_last_matches_ema() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let series = ema_series(&closes, 3);
        assert_eq!(series.len(), closes.len());
        assert_eq!(series.last().copied(), ema(&closes, 3));
    }

    #[test]
    fn ema_series_each_prefix_matches_full_fold() {
        let closes = [10.0, 12.0, 11.0, 13.0, 15.0];
        let series = ema_series(&closes, 3);
        for i in 2..closes.len() {
            assert_eq!(Some(series[i]), ema(&closes[..=i], 3));
        }
    }

    #[test]
    fn ema_series_empty_input() {
        assert!(ema_series(&[], 3).is_empty());
    }
}
