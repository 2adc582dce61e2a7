#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use tapedeck::domain::bar::PriceBar;
use tapedeck::domain::error::TapedeckError;
use tapedeck::domain::order::{OrderId, OrderRequest, OrderState, OrderStatus};
use tapedeck::domain::resolution::Resolution;
use tapedeck::domain::series::PriceSeries;
use tapedeck::domain::strategy::Strategy;
use tapedeck::domain::trader::TraderCtx;
use tapedeck::ports::broker_port::{BrokerPort, Quote};

pub fn ts(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(day)
}

/// A bar that trades at exactly one price, so replay fills are deterministic.
pub fn flat_bar(price: f64) -> PriceBar {
    PriceBar::new(price, price, price, price, 1_000.0)
}

/// Daily bars where the bar at index `i` trades at `start_price + i`.
pub fn ramp_series(symbol: &str, count: usize, start_price: f64) -> PriceSeries {
    let mut series = PriceSeries::new(Resolution::D1);
    for i in 0..count {
        series.insert(ts(i as i64), symbol, flat_bar(start_price + i as f64));
    }
    series
}

pub fn series_from_closes(symbol: &str, closes: &[f64]) -> PriceSeries {
    let mut series = PriceSeries::new(Resolution::D1);
    for (i, close) in closes.iter().enumerate() {
        series.insert(ts(i as i64), symbol, flat_bar(*close));
    }
    series
}

/// Buys a fixed quantity of one symbol every step.
pub struct BuyEachStep {
    pub symbol: String,
    pub quantity: f64,
}

impl Strategy for BuyEachStep {
    fn on_step(
        &mut self,
        ctx: &mut TraderCtx<'_>,
        _timestamp: DateTime<Utc>,
    ) -> Result<(), TapedeckError> {
        ctx.buy(&self.symbol, self.quantity)?;
        Ok(())
    }
}

/// Records what each hook saw; issues no orders.
#[derive(Default)]
pub struct Recorder {
    pub setup_runs: usize,
    pub teardown_runs: usize,
    pub timestamps: Vec<DateTime<Utc>>,
    pub prices: BTreeMap<String, Vec<f64>>,
}

impl Strategy for Recorder {
    fn setup(&mut self, _ctx: &mut TraderCtx<'_>) -> Result<(), TapedeckError> {
        self.setup_runs += 1;
        Ok(())
    }

    fn on_step(
        &mut self,
        ctx: &mut TraderCtx<'_>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), TapedeckError> {
        self.timestamps.push(timestamp);
        for symbol in ctx.symbols().to_vec() {
            let price = ctx.price(&symbol)?;
            self.prices.entry(symbol).or_default().push(price);
        }
        Ok(())
    }

    fn teardown(&mut self, _ctx: &mut TraderCtx<'_>) -> Result<(), TapedeckError> {
        self.teardown_runs += 1;
        Ok(())
    }
}

/// Fails with an upstream error on the zero-based step `fail_on`.
pub struct FailOnStep {
    pub fail_on: usize,
    pub seen: usize,
}

impl Strategy for FailOnStep {
    fn on_step(
        &mut self,
        _ctx: &mut TraderCtx<'_>,
        _timestamp: DateTime<Utc>,
    ) -> Result<(), TapedeckError> {
        if self.seen == self.fail_on {
            return Err(TapedeckError::Upstream {
                reason: "scripted failure".to_string(),
            });
        }
        self.seen += 1;
        Ok(())
    }
}

/// In-memory broker with fixed quotes and instantly-filling market orders.
pub struct StubBroker {
    pub quotes: BTreeMap<String, f64>,
    pub buying_power: f64,
    pub positions: BTreeMap<String, f64>,
    pub bars: BTreeMap<String, Vec<PriceBar>>,
    pub submitted: Vec<OrderRequest>,
    pub fail_submit: Option<String>,
    next_id: usize,
}

impl StubBroker {
    pub fn new(buying_power: f64) -> Self {
        Self {
            quotes: BTreeMap::new(),
            buying_power,
            positions: BTreeMap::new(),
            bars: BTreeMap::new(),
            submitted: Vec::new(),
            fail_submit: None,
            next_id: 0,
        }
    }

    pub fn with_quote(mut self, symbol: &str, price: f64) -> Self {
        self.quotes.insert(symbol.to_string(), price);
        self
    }

    pub fn with_position(mut self, symbol: &str, quantity: f64) -> Self {
        self.positions.insert(symbol.to_string(), quantity);
        self
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn failing_submissions(mut self, reason: &str) -> Self {
        self.fail_submit = Some(reason.to_string());
        self
    }
}

impl BrokerPort for StubBroker {
    fn quote(&mut self, symbol: &str) -> Result<Quote, TapedeckError> {
        match self.quotes.get(symbol) {
            Some(price) => Ok(Quote {
                price: *price,
                ask: *price,
                bid: *price,
            }),
            None => Err(TapedeckError::Upstream {
                reason: format!("no quote for {}", symbol),
            }),
        }
    }

    fn submit(&mut self, request: &OrderRequest) -> Result<OrderId, TapedeckError> {
        if let Some(reason) = &self.fail_submit {
            return Err(TapedeckError::Upstream {
                reason: reason.clone(),
            });
        }
        self.submitted.push(request.clone());
        self.next_id += 1;
        Ok(OrderId::new(format!("stub-{}", self.next_id)))
    }

    fn status(&mut self, _order: &OrderId) -> Result<OrderStatus, TapedeckError> {
        let request = self
            .submitted
            .last()
            .ok_or_else(|| TapedeckError::Upstream {
                reason: "status for an unknown order".to_string(),
            })?;
        let price = self.quotes.get(&request.symbol).copied();
        Ok(OrderStatus {
            state: OrderState::Filled,
            filled_quantity: request.quantity,
            average_price: price,
        })
    }

    fn cancel(&mut self, _order: &OrderId) -> Result<(), TapedeckError> {
        Ok(())
    }

    fn buying_power(&mut self) -> Result<f64, TapedeckError> {
        Ok(self.buying_power)
    }

    fn positions(&mut self) -> Result<BTreeMap<String, f64>, TapedeckError> {
        Ok(self.positions.clone())
    }

    fn recent_bars(&mut self, symbol: &str, count: usize) -> Result<Vec<PriceBar>, TapedeckError> {
        let bars = self.bars.get(symbol).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(count);
        Ok(bars.into_iter().skip(skip).collect())
    }
}
