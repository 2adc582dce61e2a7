//! Single time-bucketed price summary.

use serde::{Deserialize, Serialize};

/// One OHLCV record. Immutable once built; the series hands out copies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Lower and upper bound of the open/close span, order-safe.
    pub fn body_bounds(&self) -> (f64, f64) {
        if self.open <= self.close {
            (self.open, self.close)
        } else {
            (self.close, self.open)
        }
    }
}
