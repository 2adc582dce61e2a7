//! Cash and holdings bookkeeping.

use std::collections::BTreeMap;

/// Cash balance plus per-symbol quantities.
///
/// Deliberately permissive: `apply_buy` does not check that cash covers the
/// cost and `apply_sell` does not check that the quantity is held. Overdraft
/// and oversell are strategy bugs, not ledger errors; callers own that
/// responsibility. Only the engine's buy/sell paths mutate a ledger during a
/// run.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioLedger {
    cash: f64,
    holdings: BTreeMap<String, f64>,
}

impl PortfolioLedger {
    pub fn new() -> Self {
        Self::with_cash(0.0)
    }

    pub fn with_cash(cash: f64) -> Self {
        Self {
            cash,
            holdings: BTreeMap::new(),
        }
    }

    /// Seed from an externally observed state, e.g. a broker's buying power
    /// and open positions.
    pub fn from_parts(cash: f64, holdings: BTreeMap<String, f64>) -> Self {
        Self { cash, holdings }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Quantity held, `0.0` for a symbol never traded.
    pub fn quantity(&self, symbol: &str) -> f64 {
        self.holdings.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn holdings(&self) -> &BTreeMap<String, f64> {
        &self.holdings
    }

    /// Symbols with a nonzero quantity.
    pub fn held_symbols(&self) -> impl Iterator<Item = &str> {
        self.holdings
            .iter()
            .filter(|(_, qty)| **qty != 0.0)
            .map(|(symbol, _)| symbol.as_str())
    }

    pub fn apply_buy(&mut self, symbol: &str, quantity: f64, price: f64) {
        self.cash -= quantity * price;
        *self.holdings.entry(symbol.to_string()).or_insert(0.0) += quantity;
    }

    pub fn apply_sell(&mut self, symbol: &str, quantity: f64, price: f64) {
        self.cash += quantity * price;
        *self.holdings.entry(symbol.to_string()).or_insert(0.0) -= quantity;
    }

    /// Cash plus quantity times price over held symbols. Symbols with no
    /// entry in `prices` contribute nothing.
    pub fn market_value(&self, prices: &BTreeMap<String, f64>) -> f64 {
        let held: f64 = self
            .holdings
            .iter()
            .filter(|(_, qty)| **qty != 0.0)
            .filter_map(|(symbol, qty)| prices.get(symbol).map(|price| qty * price))
            .sum();
        self.cash + held
    }
}

impl Default for PortfolioLedger {
    fn default() -> Self {
        Self::new()
    }
}
