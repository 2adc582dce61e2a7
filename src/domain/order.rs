//! Order vocabulary shared by the engine and broker collaborators.
//!
//! The engine treats orders as opaque beyond their terminal state and the
//! quantity filled; everything else here exists so requests can be expressed
//! and forwarded without loss.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderKind {
    #[default]
    Market,
    Limit,
    StopLoss,
    StopLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeInForce {
    /// Good till cancelled.
    #[default]
    Gtc,
    /// Good for day.
    Gfd,
    /// Immediate or cancel.
    Ioc,
    /// Opening.
    Opg,
}

/// Lifecycle: queued, then confirmed, ending filled or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Queued,
    Confirmed,
    Filled,
    Cancelled,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Filled | OrderState::Cancelled)
    }
}

/// Per-call knobs for `buy_with`/`sell_with`. The defaults match the plain
/// `buy`/`sell` calls: a market order, good till cancelled, waiting for a
/// terminal state and force-cancelling whatever is still pending at timeout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderParams {
    pub kind: OrderKind,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub time_in_force: TimeInForce,
    pub wait: bool,
    pub force_cancel: bool,
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            kind: OrderKind::Market,
            limit_price: None,
            stop_price: None,
            time_in_force: TimeInForce::Gtc,
            wait: true,
            force_cancel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub symbol: String,
    pub quantity: f64,
    pub params: OrderParams,
}

impl OrderRequest {
    pub fn market(side: OrderSide, symbol: &str, quantity: f64) -> Self {
        Self {
            side,
            symbol: symbol.to_string(),
            quantity,
            params: OrderParams::default(),
        }
    }
}

/// Opaque broker-issued handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broker-reported view of one order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatus {
    pub state: OrderState,
    pub filled_quantity: f64,
    pub average_price: Option<f64>,
}

/// What a strategy gets back from a `buy`/`sell` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub state: OrderState,
    pub filled_quantity: f64,
    pub fill_price: Option<f64>,
    pub order: Option<OrderId>,
}

impl Execution {
    /// Instant simulated fill.
    pub fn filled(quantity: f64, price: f64) -> Self {
        Self {
            state: OrderState::Filled,
            filled_quantity: quantity,
            fill_price: Some(price),
            order: None,
        }
    }

    pub fn complete(&self) -> bool {
        self.state.is_terminal()
    }
}
