//! Live asset source over a broker client.

use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::ledger::PortfolioLedger;
use crate::domain::order::{Execution, OrderRequest, OrderSide};
use crate::domain::resolution::Resolution;
use crate::ports::asset_source::AssetSource;
use crate::ports::broker_port::BrokerPort;
use std::time::Duration;
use tracing::{debug, warn};

/// Prices come from quotes, fills from real orders.
///
/// `execute` submits and, unless `params.wait` is off, polls the order every
/// `poll_delay` until it is terminal or the timeout (one resolution interval
/// by default) runs out, then force-cancels what is still open when
/// `params.force_cancel` is set. Whatever quantity the final status reports
/// filled is applied to the ledger, so a partial fill before a cancel still
/// lands. Broker errors pass through unmodified; nothing is retried.
pub struct LiveSource {
    broker: Box<dyn BrokerPort>,
    poll_delay: Duration,
    timeout: Duration,
    opening: PortfolioLedger,
}

impl LiveSource {
    /// Fails with a usage error when the broker is not ready, and reads
    /// buying power and open positions once to seed the run's ledger.
    pub fn new(
        mut broker: Box<dyn BrokerPort>,
        resolution: Resolution,
    ) -> Result<Self, TapedeckError> {
        if !broker.is_ready() {
            return Err(TapedeckError::Usage {
                reason: "broker is not ready; authenticate before starting".to_string(),
            });
        }
        let cash = broker.buying_power()?;
        let positions = broker.positions()?;
        Ok(Self {
            broker,
            poll_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(resolution.seconds()),
            opening: PortfolioLedger::from_parts(cash, positions),
        })
    }

    /// Override the order-wait cadence. Tests use sub-second values.
    pub fn with_polling(mut self, poll_delay: Duration, timeout: Duration) -> Self {
        self.poll_delay = poll_delay;
        self.timeout = timeout;
        self
    }

    /// Ledger state observed at construction.
    pub fn opening_ledger(&self) -> PortfolioLedger {
        self.opening.clone()
    }
}

impl AssetSource for LiveSource {
    fn current_price(&mut self, symbol: &str) -> Result<f64, TapedeckError> {
        Ok(self.broker.quote(symbol)?.price)
    }

    fn history(&mut self, symbol: &str, count: usize) -> Result<Vec<PriceBar>, TapedeckError> {
        let bars = self.broker.recent_bars(symbol, count)?;
        if bars.len() < count {
            return Err(TapedeckError::InsufficientHistory {
                symbol: symbol.to_string(),
                requested: count,
                available: bars.len(),
            });
        }
        if bars.len() > count {
            return Ok(bars[bars.len() - count..].to_vec());
        }
        Ok(bars)
    }

    fn execute(
        &mut self,
        ledger: &mut PortfolioLedger,
        request: &OrderRequest,
    ) -> Result<Execution, TapedeckError> {
        let order_id = self.broker.submit(request)?;
        debug!(
            "submitted {} {} {} as order {}",
            request.side, request.quantity, request.symbol, order_id
        );
        let mut status = self.broker.status(&order_id)?;

        if request.params.wait {
            let mut checks =
                self.timeout.as_millis() / self.poll_delay.as_millis().max(1);
            while !status.state.is_terminal() && checks > 0 {
                std::thread::sleep(self.poll_delay);
                checks -= 1;
                status = self.broker.status(&order_id)?;
            }
            if request.params.force_cancel && !status.state.is_terminal() {
                warn!(
                    "order {} still {:?} at timeout, cancelling",
                    order_id, status.state
                );
                self.broker.cancel(&order_id)?;
                status = self.broker.status(&order_id)?;
            }
        }

        if status.filled_quantity > 0.0 {
            let price = match status.average_price {
                Some(price) => price,
                None => self.broker.quote(&request.symbol)?.price,
            };
            match request.side {
                OrderSide::Buy => ledger.apply_buy(&request.symbol, status.filled_quantity, price),
                OrderSide::Sell => {
                    ledger.apply_sell(&request.symbol, status.filled_quantity, price)
                }
            }
        }

        Ok(Execution {
            state: status.state,
            filled_quantity: status.filled_quantity,
            fill_price: status.average_price,
            order: Some(order_id),
        })
    }
}
