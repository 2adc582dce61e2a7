//! Strategy hook surface.

use crate::domain::error::TapedeckError;
use crate::domain::trader::TraderCtx;
use chrono::{DateTime, Utc};

/// The capability set a caller-supplied strategy implements.
///
/// The engine invokes the hooks only at the defined lifecycle points:
/// `setup` once after a run binds its source, `on_step` once per clock tick,
/// `teardown` once when the tick sequence ends normally. An error from any
/// hook aborts the run and propagates out of `start` unmodified; `teardown`
/// is not invoked on that path.
///
/// The same strategy value runs unmodified against replayed or live fills;
/// everything it can observe or do goes through [`TraderCtx`].
pub trait Strategy {
    /// Bars of history this strategy requires at its first step. The engine
    /// verifies availability for every declared symbol before `setup` runs,
    /// so a start offset that is too small fails up front rather than
    /// mid-run.
    fn warmup_bars(&self) -> usize {
        0
    }

    fn setup(&mut self, _ctx: &mut TraderCtx<'_>) -> Result<(), TapedeckError> {
        Ok(())
    }

    fn on_step(
        &mut self,
        ctx: &mut TraderCtx<'_>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), TapedeckError>;

    fn teardown(&mut self, _ctx: &mut TraderCtx<'_>) -> Result<(), TapedeckError> {
        Ok(())
    }
}
