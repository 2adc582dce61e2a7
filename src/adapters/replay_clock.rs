//! Step sequence over recorded timestamps.

use crate::domain::series::PriceSeries;
use crate::ports::clock_port::ClockPort;
use chrono::{DateTime, Utc};

/// Yields each recorded timestamp in order, front-loaded with the start
/// offset: offset 50 begins at the 51st timestamp so early steps have
/// history behind them. An offset at or past the end produces no ticks at
/// all, which the engine treats as a valid zero-step run.
pub struct ReplayClock {
    timestamps: Vec<DateTime<Utc>>,
    position: usize,
}

impl ReplayClock {
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            position: 0,
        }
    }

    pub fn from_series(series: &PriceSeries, start_offset: usize) -> Self {
        Self::new(series.timestamps().skip(start_offset).collect())
    }

    pub fn remaining(&self) -> usize {
        self.timestamps.len() - self.position
    }
}

impl ClockPort for ReplayClock {
    fn tick(&mut self) -> Option<DateTime<Utc>> {
        let timestamp = self.timestamps.get(self.position).copied()?;
        self.position += 1;
        Some(timestamp)
    }
}
