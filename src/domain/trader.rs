//! The trader engine: run lifecycle, step loop and trade surface.

use crate::adapters::live_source::LiveSource;
use crate::adapters::replay_clock::ReplayClock;
use crate::adapters::replay_source::ReplaySource;
use crate::adapters::wall_clock::WallClock;
use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::ledger::PortfolioLedger;
use crate::domain::order::{Execution, OrderParams, OrderRequest, OrderSide};
use crate::domain::resolution::Resolution;
use crate::domain::run_log::RunLogEntry;
use crate::domain::series::PriceSeries;
use crate::domain::strategy::Strategy;
use crate::ports::asset_source::AssetSource;
use crate::ports::broker_port::BrokerPort;
use crate::ports::clock_port::ClockPort;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraderState {
    Created,
    Setup,
    Running,
    Stopped,
}

/// Owns the declared symbol set, the ledger, the run log and the lifecycle
/// state. Sources and clocks are run-locals: bound by `start_backtest` /
/// `start_live` (or passed explicitly to [`Trader::run`]) and released when
/// the run returns, leaving the ledger and log behind for inspection.
pub struct Trader {
    symbols: Vec<String>,
    ledger: PortfolioLedger,
    log: Vec<RunLogEntry>,
    state: TraderState,
}

impl Trader {
    /// You have to be trading something; an empty symbol set is a usage
    /// error.
    pub fn new(symbols: Vec<String>) -> Result<Self, TapedeckError> {
        if symbols.is_empty() {
            return Err(TapedeckError::Usage {
                reason: "a trader needs at least one symbol".to_string(),
            });
        }
        Ok(Self {
            symbols,
            ledger: PortfolioLedger::new(),
            log: Vec::new(),
            state: TraderState::Created,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn state(&self) -> TraderState {
        self.state
    }

    pub fn cash(&self) -> f64 {
        self.ledger.cash()
    }

    pub fn quantity(&self, symbol: &str) -> f64 {
        self.ledger.quantity(symbol)
    }

    /// Entries of the most recent run, one per executed step.
    pub fn run_log(&self) -> &[RunLogEntry] {
        &self.log
    }

    /// Replay a recorded series from `start_offset` with synthetic
    /// instantaneous fills. Every declared symbol must appear in the series.
    /// An offset at or past the end yields a zero-step run.
    pub fn start_backtest(
        &mut self,
        strategy: &mut dyn Strategy,
        series: &PriceSeries,
        initial_cash: f64,
        start_offset: usize,
    ) -> Result<(), TapedeckError> {
        for symbol in &self.symbols {
            if !series.has_symbol(symbol) {
                return Err(TapedeckError::Usage {
                    reason: format!("declared symbol '{}' is not in the series", symbol),
                });
            }
        }
        let mut source = ReplaySource::new(series);
        let mut clock = ReplayClock::from_series(series, start_offset);
        self.run(
            strategy,
            &mut source,
            &mut clock,
            PortfolioLedger::with_cash(initial_cash),
        )
    }

    /// Trade for real against an already-authenticated broker, one step per
    /// resolution interval, until `until` passes (or forever when `None`).
    pub fn start_live(
        &mut self,
        strategy: &mut dyn Strategy,
        broker: Box<dyn BrokerPort>,
        resolution: Resolution,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), TapedeckError> {
        let mut source = LiveSource::new(broker, resolution)?;
        let opening = source.opening_ledger();
        let mut clock = WallClock::new(resolution.duration(), until);
        self.run(strategy, &mut source, &mut clock, opening)
    }

    /// The engine both start methods wrap. Public so callers can mix their
    /// own sources and clocks.
    ///
    /// Sequence: clear the previous log, install the opening ledger, verify
    /// the strategy's warmup needs at the first step, invoke `setup`, then
    /// per tick invoke `on_step` and append a log entry, and finally invoke
    /// `teardown`. Errors from hooks or the source propagate unmodified and
    /// skip `teardown`; the log keeps the entries of the steps that finished.
    pub fn run(
        &mut self,
        strategy: &mut dyn Strategy,
        source: &mut dyn AssetSource,
        clock: &mut dyn ClockPort,
        opening: PortfolioLedger,
    ) -> Result<(), TapedeckError> {
        let result = self.drive(strategy, source, clock, opening);
        self.state = TraderState::Stopped;
        result
    }

    fn drive(
        &mut self,
        strategy: &mut dyn Strategy,
        source: &mut dyn AssetSource,
        clock: &mut dyn ClockPort,
        opening: PortfolioLedger,
    ) -> Result<(), TapedeckError> {
        self.log.clear();
        self.ledger = opening;
        self.state = TraderState::Setup;

        let mut next = clock.tick();

        // Position the source on the first step before `setup` so hooks can
        // price and read history right away, and fail a too-small start
        // offset here rather than mid-run.
        if let Some(first) = next {
            source.begin_step(first);
            let warmup = strategy.warmup_bars();
            if warmup > 0 {
                for symbol in &self.symbols {
                    source.history(symbol, warmup)?;
                }
            }
        }

        {
            let mut ctx = TraderCtx {
                symbols: &self.symbols,
                ledger: &mut self.ledger,
                source: &mut *source,
            };
            strategy.setup(&mut ctx)?;
        }
        self.state = TraderState::Running;

        while let Some(timestamp) = next {
            source.begin_step(timestamp);
            debug!("step at {}", timestamp);

            let opening_cash = self.ledger.cash();
            let opening_value = valuation(&self.ledger, &mut *source);

            {
                let mut ctx = TraderCtx {
                    symbols: &self.symbols,
                    ledger: &mut self.ledger,
                    source: &mut *source,
                };
                strategy.on_step(&mut ctx, timestamp)?;
            }

            let mut holdings = BTreeMap::new();
            for symbol in &self.symbols {
                holdings.insert(symbol.clone(), self.ledger.quantity(symbol));
            }
            self.log.push(RunLogEntry {
                timestamp,
                opening_cash,
                opening_value,
                cash: self.ledger.cash(),
                portfolio_value: valuation(&self.ledger, &mut *source),
                holdings,
            });

            next = clock.tick();
        }

        let mut ctx = TraderCtx {
            symbols: &self.symbols,
            ledger: &mut self.ledger,
            source: &mut *source,
        };
        strategy.teardown(&mut ctx)?;
        Ok(())
    }
}

/// Mark-to-market over held symbols; a symbol whose price is unavailable
/// this step contributes nothing rather than aborting the run.
fn valuation(ledger: &PortfolioLedger, source: &mut dyn AssetSource) -> f64 {
    let mut prices = BTreeMap::new();
    for symbol in ledger.held_symbols() {
        if let Ok(price) = source.current_price(symbol) {
            prices.insert(symbol.to_string(), price);
        }
    }
    ledger.market_value(&prices)
}

/// What hooks see: the declared symbols, the ledger (read-only from the
/// strategy's point of view) and the bound source. All trading goes through
/// here, so the ledger is only ever mutated by `execute` inside a buy or
/// sell. Any operation on a symbol outside the declared set is a usage
/// error.
pub struct TraderCtx<'a> {
    symbols: &'a [String],
    ledger: &'a mut PortfolioLedger,
    source: &'a mut dyn AssetSource,
}

impl TraderCtx<'_> {
    fn ensure_declared(&self, symbol: &str) -> Result<(), TapedeckError> {
        if self.symbols.iter().any(|declared| declared == symbol) {
            Ok(())
        } else {
            Err(TapedeckError::Usage {
                reason: format!("symbol '{}' is not in the declared set", symbol),
            })
        }
    }

    pub fn symbols(&self) -> &[String] {
        self.symbols
    }

    pub fn cash(&self) -> f64 {
        self.ledger.cash()
    }

    pub fn portfolio_value(&mut self) -> f64 {
        valuation(self.ledger, &mut *self.source)
    }

    pub fn quantity(&self, symbol: &str) -> Result<f64, TapedeckError> {
        self.ensure_declared(symbol)?;
        Ok(self.ledger.quantity(symbol))
    }

    pub fn price(&mut self, symbol: &str) -> Result<f64, TapedeckError> {
        self.ensure_declared(symbol)?;
        self.source.current_price(symbol)
    }

    pub fn history(&mut self, symbol: &str, count: usize) -> Result<Vec<PriceBar>, TapedeckError> {
        self.ensure_declared(symbol)?;
        self.source.history(symbol, count)
    }

    pub fn buy(&mut self, symbol: &str, quantity: f64) -> Result<Execution, TapedeckError> {
        self.buy_with(symbol, quantity, OrderParams::default())
    }

    pub fn buy_with(
        &mut self,
        symbol: &str,
        quantity: f64,
        params: OrderParams,
    ) -> Result<Execution, TapedeckError> {
        self.place(OrderSide::Buy, symbol, quantity, params)
    }

    pub fn sell(&mut self, symbol: &str, quantity: f64) -> Result<Execution, TapedeckError> {
        self.sell_with(symbol, quantity, OrderParams::default())
    }

    pub fn sell_with(
        &mut self,
        symbol: &str,
        quantity: f64,
        params: OrderParams,
    ) -> Result<Execution, TapedeckError> {
        self.place(OrderSide::Sell, symbol, quantity, params)
    }

    /// Buy or sell whatever delta moves the held quantity to `target`; a
    /// zero delta issues nothing.
    pub fn set_quantity(
        &mut self,
        symbol: &str,
        target: f64,
    ) -> Result<Option<Execution>, TapedeckError> {
        let current = self.quantity(symbol)?;
        let delta = target - current;
        if delta > 0.0 {
            self.buy(symbol, delta).map(Some)
        } else if delta < 0.0 {
            self.sell(symbol, -delta).map(Some)
        } else {
            Ok(None)
        }
    }

    fn place(
        &mut self,
        side: OrderSide,
        symbol: &str,
        quantity: f64,
        params: OrderParams,
    ) -> Result<Execution, TapedeckError> {
        self.ensure_declared(symbol)?;
        let request = OrderRequest {
            side,
            symbol: symbol.to_string(),
            quantity,
            params,
        };
        let execution = self.source.execute(self.ledger, &request)?;
        debug!(
            "{} {} {} -> {:?} ({} filled)",
            side, quantity, symbol, execution.state, execution.filled_quantity
        );
        Ok(execution)
    }
}
