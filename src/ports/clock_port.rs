//! Step sequencing.

use chrono::{DateTime, Utc};

/// Produces the timestamp of each step, `None` when the run is over. Replay
/// clocks iterate recorded timestamps; wall clocks block until real time
/// reaches the next interval.
pub trait ClockPort {
    fn tick(&mut self) -> Option<DateTime<Utc>>;
}
