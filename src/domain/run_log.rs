//! Per-step run records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One record per executed step, appended only after that step's hook and
/// every trade call inside it returned. Opening figures are captured just
/// before the hook runs; the rest just after. A run that fails mid-step
/// keeps the entries of the steps before it and nothing for the failing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub opening_cash: f64,
    pub opening_value: f64,
    pub cash: f64,
    pub portfolio_value: f64,
    /// Quantity per declared symbol, `0.0` when unheld.
    pub holdings: BTreeMap<String, f64>,
}

impl RunLogEntry {
    /// Portfolio value change across the step.
    pub fn net_change(&self) -> f64 {
        self.portfolio_value - self.opening_value
    }
}
