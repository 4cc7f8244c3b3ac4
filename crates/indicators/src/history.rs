//! Price history model.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One day's bar for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Trading day of the observation
    pub date: DateTime<Utc>,

    /// Opening price
    pub open: f64,

    /// Session high
    pub high: f64,

    /// Session low
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Ordered price series, oldest first, one bar per date.
///
/// The constructor sorts by date and collapses same-date restatements
/// (the later-supplied bar wins), so callers may hand points in any
/// order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    points: Vec<HistoricalPoint>,
}

impl PriceHistory {
    /// Build a history from points, sorted oldest first with duplicate
    /// dates collapsed.
    pub fn new(points: Vec<HistoricalPoint>) -> Self {
        let mut by_date = BTreeMap::new();
        for point in points {
            by_date.insert(point.date, point);
        }
        Self {
            points: by_date.into_values().collect(),
        }
    }

    /// Build a history from bare closes as synthetic flat daily bars.
    pub fn from_closes(closes: &[f64]) -> Self {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).single();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| HistoricalPoint {
                date: base.map_or_else(Utc::now, |b| b + Duration::days(i as i64)),
                open: close,
                high: close,
                low: close,
                close,
                volume: None,
            })
            .collect();
        Self { points }
    }

    /// Append a bar. A bar restated for the last date replaces it; an
    /// out-of-order date re-sorts the series.
    pub fn push(&mut self, point: HistoricalPoint) {
        match self.points.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            Some(last) if last.date > point.date => {
                self.points.push(point);
                let points = std::mem::take(&mut self.points);
                self.points = Self::new(points).points;
            }
            _ => self.points.push(point),
        }
    }

    /// Close prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// The most recent bar.
    pub fn latest(&self) -> Option<&HistoricalPoint> {
        self.points.last()
    }

    pub fn points(&self) -> &[HistoricalPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
