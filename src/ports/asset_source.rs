//! Price and execution capability set.

use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::ledger::PortfolioLedger;
use crate::domain::order::{Execution, OrderRequest};
use chrono::{DateTime, Utc};

/// Where prices, history and fills come from.
///
/// Strategy code is written once against this trait; the engine binds either
/// a replay source over a recorded series or a live source over a broker at
/// start time. `execute` applies whatever quantity filled to the ledger
/// before returning, so the ledger and the source never disagree about a
/// completed trade.
pub trait AssetSource {
    /// Called by the engine as each step begins. Replay sources move their
    /// cursor here; live sources have nothing to do.
    fn begin_step(&mut self, _timestamp: DateTime<Utc>) {}

    /// Price of one unit of `symbol` at the current step.
    fn current_price(&mut self, symbol: &str) -> Result<f64, TapedeckError>;

    /// The `count` most recent bars at or before the current step, oldest
    /// first. Fewer available than requested is an
    /// [`TapedeckError::InsufficientHistory`] error.
    fn history(&mut self, symbol: &str, count: usize) -> Result<Vec<PriceBar>, TapedeckError>;

    fn execute(
        &mut self,
        ledger: &mut PortfolioLedger,
        request: &OrderRequest,
    ) -> Result<Execution, TapedeckError>;
}
