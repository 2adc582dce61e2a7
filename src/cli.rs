//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::cryptocompare::CryptoCompare;
use crate::adapters::csv_series;
use crate::adapters::file_config::FileConfig;
use crate::adapters::replay_clock::ReplayClock;
use crate::adapters::replay_source::ReplaySource;
use crate::adapters::snapshot;
use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::ledger::PortfolioLedger;
use crate::domain::resolution::Resolution;
use crate::domain::series::PriceSeries;
use crate::domain::strategy::Strategy;
use crate::domain::trader::{Trader, TraderCtx};
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "tapedeck", about = "Recorded-market trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a CSV of bars into a series snapshot
    Import {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "1d")]
        resolution: String,
    },
    /// Download history from CryptoCompare into a series snapshot
    Fetch {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "USD")]
        to_symbol: String,
        #[arg(long, default_value = "1d")]
        resolution: String,
        #[arg(long, default_value_t = 365)]
        limit: u32,
        /// Unix seconds of the last bar to fetch
        #[arg(long)]
        to_ts: Option<i64>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Merge two snapshots; the second wins where they clash
    Merge {
        left: PathBuf,
        right: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show the span, symbols and bar counts of a snapshot
    Info { snapshot: PathBuf },
    /// Replay a built-in strategy over a snapshot
    Backtest {
        #[arg(short, long)]
        snapshot: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// buy-hold or sma-cross
        #[arg(long)]
        strategy: Option<String>,
        /// Comma-separated symbols to trade; defaults to every symbol in
        /// the snapshot
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        cash: Option<f64>,
        #[arg(long)]
        start_offset: Option<usize>,
        /// Fix the fill-price sampling for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
        /// Write the per-step run log as JSON
        #[arg(long)]
        log_output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Import {
            input,
            output,
            symbol,
            resolution,
        } => run_import(&input, &output, &symbol, &resolution),
        Command::Fetch {
            symbol,
            to_symbol,
            resolution,
            limit,
            to_ts,
            output,
        } => run_fetch(&symbol, &to_symbol, &resolution, limit, to_ts, &output),
        Command::Merge {
            left,
            right,
            output,
        } => run_merge(&left, &right, &output),
        Command::Info { snapshot } => run_info(&snapshot),
        Command::Backtest {
            snapshot,
            config,
            strategy,
            symbols,
            cash,
            start_offset,
            seed,
            log_output,
        } => run_replay(
            &snapshot,
            config.as_ref(),
            strategy.as_deref(),
            symbols.as_deref(),
            cash,
            start_offset,
            seed,
            log_output.as_ref(),
        ),
    }
}

fn run_import(input: &PathBuf, output: &PathBuf, symbol: &str, resolution: &str) -> ExitCode {
    let resolution = match resolution.parse::<Resolution>() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Importing {} from {}", symbol, input.display());
    let series = match csv_series::load_series(input, symbol, resolution) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    write_snapshot(&series, output)
}

fn run_fetch(
    symbol: &str,
    to_symbol: &str,
    resolution: &str,
    limit: u32,
    to_ts: Option<i64>,
    output: &PathBuf,
) -> ExitCode {
    let resolution = match resolution.parse::<Resolution>() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Fetching {} {} bars of {}/{}",
        limit, resolution, symbol, to_symbol
    );
    let series = match CryptoCompare::new().fetch(symbol, to_symbol, resolution, limit, to_ts) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    write_snapshot(&series, output)
}

fn run_merge(left_path: &PathBuf, right_path: &PathBuf, output: &PathBuf) -> ExitCode {
    let left = match load_snapshot(left_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let right = match load_snapshot(right_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let merged = match left.merge(&right) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Merged {} and {} steps into {}",
        left.len(),
        right.len(),
        merged.len()
    );
    write_snapshot(&merged, output)
}

fn run_info(snapshot_path: &PathBuf) -> ExitCode {
    let series = match load_snapshot(snapshot_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    println!("resolution: {}", series.resolution());
    println!("steps: {}", series.len());
    match (series.first_timestamp(), series.last_timestamp()) {
        (Some(first), Some(last)) => println!("span: {} to {}", first, last),
        _ => println!("span: empty"),
    }
    for symbol in series.symbols() {
        println!("{}: {} bars", symbol, series.bar_count(symbol));
    }
    ExitCode::SUCCESS
}

#[allow(clippy::too_many_arguments)]
fn run_replay(
    snapshot_path: &PathBuf,
    config_path: Option<&PathBuf>,
    strategy_override: Option<&str>,
    symbols_override: Option<&str>,
    cash_override: Option<f64>,
    offset_override: Option<usize>,
    seed: Option<u64>,
    log_output: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading snapshot from {}", snapshot_path.display());
    let series = match load_snapshot(snapshot_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let config = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match FileConfig::from_file(path) {
                Ok(c) => Some(c),
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            }
        }
        None => None,
    };
    let config = config.as_ref();

    let symbols = resolve_symbols(symbols_override, config, &series);
    if symbols.is_empty() {
        eprintln!("error: no symbols to trade");
        return ExitCode::from(2);
    }
    for symbol in &symbols {
        if !series.has_symbol(symbol) {
            let err = TapedeckError::Usage {
                reason: format!("symbol '{}' is not in the snapshot", symbol),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    }

    let strategy_name = strategy_override
        .map(str::to_string)
        .or_else(|| config.and_then(|c| c.get_string("backtest", "strategy")))
        .unwrap_or_else(|| "buy-hold".to_string());
    let mut strategy = match build_strategy(&strategy_name, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let cash = cash_override
        .or_else(|| config.and_then(|c| c.get_double("backtest", "cash")))
        .unwrap_or(10_000.0);
    let start_offset = match resolve_start_offset(offset_override, config) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut trader = match Trader::new(symbols) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Replaying {} with {} over {} {} steps",
        strategy_name,
        trader.symbols().join(", "),
        series.len().saturating_sub(start_offset),
        series.resolution()
    );

    let mut source = match seed {
        Some(seed) => ReplaySource::with_seed(&series, seed),
        None => ReplaySource::new(&series),
    };
    let mut clock = ReplayClock::from_series(&series, start_offset);
    if let Err(e) = trader.run(
        strategy.as_mut(),
        &mut source,
        &mut clock,
        PortfolioLedger::with_cash(cash),
    ) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let log = trader.run_log();
    eprintln!("\n=== Run Summary ===");
    eprintln!("Steps executed:   {}", log.len());
    eprintln!("Opening cash:     {:.2}", cash);
    eprintln!("Closing cash:     {:.2}", trader.cash());
    if let Some(last) = log.last() {
        eprintln!("Closing value:    {:.2}", last.portfolio_value);
        eprintln!("Net change:       {:+.2}", last.portfolio_value - cash);
        for (symbol, quantity) in &last.holdings {
            if *quantity != 0.0 {
                eprintln!("  {}: {}", symbol, quantity);
            }
        }
    }

    if let Some(path) = log_output {
        let json = match serde_json::to_string_pretty(log) {
            Ok(j) => j,
            Err(e) => {
                eprintln!("error: failed to encode run log: {e}");
                return ExitCode::from(3);
            }
        };
        match fs::write(path, json) {
            Ok(()) => eprintln!("\nRun log written to: {}", path.display()),
            Err(e) => {
                eprintln!("error: failed to write run log: {e}");
                return ExitCode::from(1);
            }
        }
    }

    ExitCode::SUCCESS
}

fn load_snapshot(path: &PathBuf) -> Result<PriceSeries, ExitCode> {
    snapshot::load(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn write_snapshot(series: &PriceSeries, output: &PathBuf) -> ExitCode {
    match snapshot::save(series, output) {
        Ok(()) => {
            eprintln!("Wrote {} steps to {}", series.len(), output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Flag beats config beats "everything in the snapshot".
pub fn resolve_symbols(
    flag: Option<&str>,
    config: Option<&FileConfig>,
    series: &PriceSeries,
) -> Vec<String> {
    if let Some(list) = flag {
        return split_symbols(list);
    }
    if let Some(list) = config.and_then(|c| c.get_string("backtest", "symbols")) {
        return split_symbols(&list);
    }
    series.symbols().iter().cloned().collect()
}

fn split_symbols(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn resolve_start_offset(
    flag: Option<usize>,
    config: Option<&FileConfig>,
) -> Result<usize, TapedeckError> {
    if let Some(v) = flag {
        return Ok(v);
    }
    match config.and_then(|c| c.get_int("backtest", "start_offset")) {
        Some(v) => usize::try_from(v).map_err(|_| TapedeckError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_offset".to_string(),
            reason: "must not be negative".to_string(),
        }),
        None => Ok(0),
    }
}

pub fn build_strategy(
    name: &str,
    config: Option<&FileConfig>,
) -> Result<Box<dyn Strategy>, TapedeckError> {
    match name {
        "buy-hold" => Ok(Box::new(BuyHold::default())),
        "sma-cross" => {
            let fast = sma_period(config, "fast", 10)?;
            let slow = sma_period(config, "slow", 30)?;
            if fast >= slow {
                return Err(TapedeckError::ConfigInvalid {
                    section: "sma".to_string(),
                    key: "fast".to_string(),
                    reason: "fast period must be shorter than slow".to_string(),
                });
            }
            let quantity = config
                .and_then(|c| c.get_double("sma", "quantity"))
                .unwrap_or(1.0);
            Ok(Box::new(SmaCross::new(fast, slow, quantity)))
        }
        other => Err(TapedeckError::Usage {
            reason: format!(
                "unknown strategy '{}' (expected buy-hold or sma-cross)",
                other
            ),
        }),
    }
}

fn sma_period(
    config: Option<&FileConfig>,
    key: &str,
    default: usize,
) -> Result<usize, TapedeckError> {
    match config.and_then(|c| c.get_int("sma", key)) {
        Some(v) if v >= 1 => Ok(v as usize),
        Some(_) => Err(TapedeckError::ConfigInvalid {
            section: "sma".to_string(),
            key: key.to_string(),
            reason: "must be at least 1".to_string(),
        }),
        None => Ok(default),
    }
}

/// Puts the opening cash to work evenly across the declared symbols on the
/// first step and holds to the end.
#[derive(Debug, Default)]
pub struct BuyHold {
    invested: bool,
}

impl Strategy for BuyHold {
    fn on_step(
        &mut self,
        ctx: &mut TraderCtx<'_>,
        _timestamp: DateTime<Utc>,
    ) -> Result<(), TapedeckError> {
        if self.invested {
            return Ok(());
        }
        let symbols = ctx.symbols().to_vec();
        let budget = ctx.cash() / symbols.len() as f64;
        for symbol in &symbols {
            let price = ctx.price(symbol)?;
            if price > 0.0 {
                ctx.buy(symbol, budget / price)?;
            }
        }
        self.invested = true;
        Ok(())
    }
}

/// Moving-average crossover: hold `quantity` of each symbol while the fast
/// average of closes sits above the slow one, hold nothing otherwise.
#[derive(Debug)]
pub struct SmaCross {
    fast: usize,
    slow: usize,
    quantity: f64,
}

impl SmaCross {
    pub fn new(fast: usize, slow: usize, quantity: f64) -> Self {
        Self {
            fast,
            slow,
            quantity,
        }
    }
}

impl Strategy for SmaCross {
    fn warmup_bars(&self) -> usize {
        self.slow
    }

    fn on_step(
        &mut self,
        ctx: &mut TraderCtx<'_>,
        _timestamp: DateTime<Utc>,
    ) -> Result<(), TapedeckError> {
        for symbol in ctx.symbols().to_vec() {
            let bars = ctx.history(&symbol, self.slow)?;
            let slow_avg = mean_close(&bars);
            let fast_avg = mean_close(&bars[bars.len() - self.fast..]);
            if fast_avg > slow_avg {
                ctx.set_quantity(&symbol, self.quantity)?;
            } else if fast_avg < slow_avg {
                ctx.set_quantity(&symbol, 0.0)?;
            }
        }
        Ok(())
    }
}

fn mean_close(bars: &[PriceBar]) -> f64 {
    bars.iter().map(|bar| bar.close).sum::<f64>() / bars.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn flat_series(closes: &[f64]) -> PriceSeries {
        let mut series = PriceSeries::new(Resolution::D1);
        for (i, close) in closes.iter().enumerate() {
            let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::days(i as i64);
            series.insert(ts, "BTC", PriceBar::new(*close, *close, *close, *close, 1.0));
        }
        series
    }

    #[test]
    fn buy_hold_invests_once_and_holds() {
        let series = flat_series(&[10.0, 10.0, 10.0, 10.0]);
        let mut trader = Trader::new(vec!["BTC".to_string()]).unwrap();
        let mut strategy = BuyHold::default();
        trader
            .start_backtest(&mut strategy, &series, 100.0, 0)
            .unwrap();

        assert_eq!(trader.run_log().len(), 4);
        assert!((trader.quantity("BTC") - 10.0).abs() < 1e-9);
        assert!(trader.cash().abs() < 1e-9);
    }

    #[test]
    fn sma_cross_needs_warmup_bars() {
        let series = flat_series(&[10.0, 10.0, 10.0]);
        let mut trader = Trader::new(vec!["BTC".to_string()]).unwrap();
        let mut strategy = SmaCross::new(2, 5, 1.0);
        let err = trader
            .start_backtest(&mut strategy, &series, 100.0, 0)
            .unwrap_err();
        assert!(matches!(err, TapedeckError::InsufficientHistory { .. }));
    }

    #[test]
    fn sma_cross_enters_on_rise_and_exits_on_fall() {
        // Ten flat bars, a spike, then a crash.
        let mut closes = vec![10.0; 10];
        closes.extend_from_slice(&[20.0, 20.0, 1.0, 1.0, 1.0, 1.0]);
        let series = flat_series(&closes);

        let mut trader = Trader::new(vec!["BTC".to_string()]).unwrap();
        let mut strategy = SmaCross::new(2, 4, 3.0);
        trader
            .start_backtest(&mut strategy, &series, 1_000.0, 4)
            .unwrap();

        let log = trader.run_log();
        // Entered while the spike lifted the fast average, flat again after
        // the crash dragged it below the slow one.
        assert!(log.iter().any(|entry| entry.holdings["BTC"] > 0.0));
        assert!((trader.quantity("BTC") - 0.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_strategy_name_is_a_usage_error() {
        let err = build_strategy("momentum", None).unwrap_err();
        assert!(matches!(err, TapedeckError::Usage { .. }));
    }

    #[test]
    fn sma_periods_come_from_config_and_are_validated() {
        let config = FileConfig::from_string("[sma]\nfast = 3\nslow = 2\n").unwrap();
        let err = build_strategy("sma-cross", Some(&config)).unwrap_err();
        assert!(matches!(err, TapedeckError::ConfigInvalid { .. }));
    }

    #[test]
    fn symbols_fall_back_from_flag_to_config_to_snapshot() {
        let series = flat_series(&[10.0]);
        let config = FileConfig::from_string("[backtest]\nsymbols = eth, doge\n").unwrap();

        assert_eq!(
            resolve_symbols(Some("btc"), Some(&config), &series),
            vec!["BTC".to_string()]
        );
        assert_eq!(
            resolve_symbols(None, Some(&config), &series),
            vec!["ETH".to_string(), "DOGE".to_string()]
        );
        assert_eq!(
            resolve_symbols(None, None, &series),
            vec!["BTC".to_string()]
        );
    }
}
