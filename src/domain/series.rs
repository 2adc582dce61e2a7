//! Time-indexed price table, the replay input for every backtest.

use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::resolution::Resolution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Ordered mapping of timestamp to per-symbol bars at one fixed resolution.
///
/// Timestamps are unique and iterate in order. A symbol missing at some
/// timestamp is a valid "no data" state, not an error. Built once by a
/// loader, fetcher or merge, then treated as read-only; a shared reference
/// can back any number of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    resolution: Resolution,
    symbols: BTreeSet<String>,
    data: BTreeMap<DateTime<Utc>, BTreeMap<String, PriceBar>>,
}

impl PriceSeries {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            symbols: BTreeSet::new(),
            data: BTreeMap::new(),
        }
    }

    /// Construction-time insert. Declares the symbol if it is new; an
    /// existing (timestamp, symbol) entry is overwritten.
    pub fn insert(&mut self, timestamp: DateTime<Utc>, symbol: &str, bar: PriceBar) {
        self.data
            .entry(timestamp)
            .or_default()
            .insert(symbol.to_string(), bar);
        self.symbols.insert(symbol.to_string());
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Number of distinct timestamps.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bars present for one symbol across the whole series.
    pub fn bar_count(&self, symbol: &str) -> usize {
        self.data.values().filter(|row| row.contains_key(symbol)).count()
    }

    /// Point lookup. `None` for an absent timestamp or an absent
    /// symbol-at-timestamp.
    pub fn at(&self, timestamp: DateTime<Utc>, symbol: &str) -> Option<&PriceBar> {
        self.data.get(&timestamp).and_then(|row| row.get(symbol))
    }

    /// The `count` bars for `symbol` at or before `timestamp`, oldest first.
    /// Timestamps where the symbol has no bar do not count toward the window.
    pub fn window(
        &self,
        timestamp: DateTime<Utc>,
        symbol: &str,
        count: usize,
    ) -> Result<Vec<PriceBar>, TapedeckError> {
        let mut bars: Vec<PriceBar> = self
            .data
            .range(..=timestamp)
            .rev()
            .filter_map(|(_, row)| row.get(symbol).copied())
            .take(count)
            .collect();
        if bars.len() < count {
            return Err(TapedeckError::InsufficientHistory {
                symbol: symbol.to_string(),
                requested: count,
                available: bars.len(),
            });
        }
        bars.reverse();
        Ok(bars)
    }

    /// Ordered, de-duplicated timestamps. Restartable; call again for a
    /// fresh pass.
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.data.keys().copied()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.data.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.data.keys().next_back().copied()
    }

    /// New series covering the union of timestamps and symbols. Where both
    /// sides hold the same (timestamp, symbol), `other` wins. Resolutions
    /// must match.
    pub fn merge(&self, other: &PriceSeries) -> Result<PriceSeries, TapedeckError> {
        if self.resolution != other.resolution {
            return Err(TapedeckError::IncompatibleResolution {
                left: self.resolution,
                right: other.resolution,
            });
        }
        let mut merged = self.clone();
        for (timestamp, row) in &other.data {
            let target = merged.data.entry(*timestamp).or_default();
            for (symbol, bar) in row {
                target.insert(symbol.clone(), *bar);
            }
        }
        merged.symbols.extend(other.symbols.iter().cloned());
        Ok(merged)
    }
}

impl fmt::Display for PriceSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => write!(
                f,
                "{} series, {} symbols, {} timestamps from {} to {}",
                self.resolution,
                self.symbols.len(),
                self.data.len(),
                first,
                last
            ),
            _ => write!(f, "{} series, empty", self.resolution),
        }
    }
}
