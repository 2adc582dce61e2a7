//! Backtest asset source over a recorded series.

use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::ledger::PortfolioLedger;
use crate::domain::order::{Execution, OrderRequest, OrderSide};
use crate::domain::series::PriceSeries;
use crate::ports::asset_source::AssetSource;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Prices and fills drawn from a `PriceSeries` at the engine's cursor.
///
/// `current_price` samples pseudo-randomly inside the current bar's
/// open/close span, modeling intra-bar execution uncertainty instead of
/// always trading at the close. `execute` fills the full quantity
/// instantly and unconditionally; affordability is the strategy's problem.
pub struct ReplaySource<'a> {
    series: &'a PriceSeries,
    cursor: Option<DateTime<Utc>>,
    rng: StdRng,
}

impl<'a> ReplaySource<'a> {
    pub fn new(series: &'a PriceSeries) -> Self {
        Self {
            series,
            cursor: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sampling for tests.
    pub fn with_seed(series: &'a PriceSeries, seed: u64) -> Self {
        Self {
            series,
            cursor: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn cursor(&self) -> Result<DateTime<Utc>, TapedeckError> {
        self.cursor.ok_or_else(|| TapedeckError::Usage {
            reason: "replay source has no current step; use it through a run".to_string(),
        })
    }
}

impl AssetSource for ReplaySource<'_> {
    fn begin_step(&mut self, timestamp: DateTime<Utc>) {
        self.cursor = Some(timestamp);
    }

    fn current_price(&mut self, symbol: &str) -> Result<f64, TapedeckError> {
        let at = self.cursor()?;
        let bar = self
            .series
            .at(at, symbol)
            .ok_or_else(|| TapedeckError::Data {
                reason: format!("no bar for {} at {}", symbol, at),
            })?;
        let (low, high) = bar.body_bounds();
        Ok(self.rng.gen_range(low..=high))
    }

    fn history(&mut self, symbol: &str, count: usize) -> Result<Vec<PriceBar>, TapedeckError> {
        let at = self.cursor()?;
        self.series.window(at, symbol, count)
    }

    fn execute(
        &mut self,
        ledger: &mut PortfolioLedger,
        request: &OrderRequest,
    ) -> Result<Execution, TapedeckError> {
        let price = self.current_price(&request.symbol)?;
        match request.side {
            OrderSide::Buy => ledger.apply_buy(&request.symbol, request.quantity, price),
            OrderSide::Sell => ledger.apply_sell(&request.symbol, request.quantity, price),
        }
        Ok(Execution::filled(request.quantity, price))
    }
}
