//! Indicator summary at conventional periods.

use serde::{Deserialize, Serialize};

use crate::ema::ema;
use crate::history::PriceHistory;
use crate::macd::{macd, Macd};
use crate::rsi::rsi;
use crate::sma::sma;

/// Standard lookbacks.
pub const SMA_SHORT_PERIOD: usize = 20;
pub const SMA_LONG_PERIOD: usize = 50;
pub const EMA_PERIOD: usize = 20;
pub const RSI_PERIOD: usize = 14;

/// All indicators at their conventional periods.
///
/// Each field is independently `None` when its own data requirement
/// is unmet.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IndicatorSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_20: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_50: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_20: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_14: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<Macd>,
}

/// Compute every indicator the history can support.
pub fn compute_indicators(history: &PriceHistory) -> IndicatorSet {
    let closes = history.closes();
    IndicatorSet {
        sma_20: sma(&closes, SMA_SHORT_PERIOD),
        sma_50: sma(&closes, SMA_LONG_PERIOD),
        ema_20: ema(&closes, EMA_PERIOD),
        rsi_14: rsi(&closes, RSI_PERIOD),
        macd: macd(&closes),
    }
}
