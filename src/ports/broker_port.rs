//! Live collaborator contract.

use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::order::{OrderId, OrderRequest, OrderStatus};
use std::collections::BTreeMap;

/// One quote snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub ask: f64,
    pub bid: f64,
}

/// An already-authenticated brokerage client.
///
/// Implementations live outside this crate; the engine assumes the client is
/// ready when handed over and never drives login or session renewal. Errors
/// cross this boundary unmodified and are never retried.
pub trait BrokerPort {
    /// Whether the client is authenticated and usable.
    fn is_ready(&self) -> bool {
        true
    }

    fn quote(&mut self, symbol: &str) -> Result<Quote, TapedeckError>;

    fn submit(&mut self, request: &OrderRequest) -> Result<OrderId, TapedeckError>;

    fn status(&mut self, order: &OrderId) -> Result<OrderStatus, TapedeckError>;

    fn cancel(&mut self, order: &OrderId) -> Result<(), TapedeckError>;

    /// Cash available to trade.
    fn buying_power(&mut self) -> Result<f64, TapedeckError>;

    /// Open positions as symbol to quantity.
    fn positions(&mut self) -> Result<BTreeMap<String, f64>, TapedeckError>;

    /// The most recent `count` bars for `symbol`, oldest first. May return
    /// fewer when the venue has less history.
    fn recent_bars(&mut self, symbol: &str, count: usize)
    -> Result<Vec<PriceBar>, TapedeckError>;
}
