//! Wall-time step sequence for live runs.

use crate::ports::clock_port::ClockPort;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

/// Ticks once per interval of real time. The first tick fires immediately;
/// each later one blocks until the interval since the previous tick has
/// elapsed, logging a warning when the caller's step already overran it.
/// Once `until` passes, ticking ends.
pub struct WallClock {
    interval: Duration,
    until: Option<DateTime<Utc>>,
    previous: Option<DateTime<Utc>>,
}

impl WallClock {
    pub fn new(interval: Duration, until: Option<DateTime<Utc>>) -> Self {
        Self {
            interval,
            until,
            previous: None,
        }
    }
}

impl ClockPort for WallClock {
    fn tick(&mut self) -> Option<DateTime<Utc>> {
        if let Some(previous) = self.previous {
            let target = previous + self.interval;
            let wait = target - Utc::now();
            if wait <= Duration::zero() {
                warn!(
                    "strategy step took longer than one {}s interval",
                    self.interval.num_seconds()
                );
            } else if let Ok(wait) = wait.to_std() {
                std::thread::sleep(wait);
            }
        }

        let now = Utc::now();
        if let Some(until) = self.until {
            if now > until {
                return None;
            }
        }
        self.previous = Some(now);
        Some(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_immediate() {
        let mut clock = WallClock::new(Duration::seconds(30), None);
        let before = Utc::now();
        let tick = clock.tick().unwrap();
        assert!(tick >= before);
        assert!(Utc::now() - before < Duration::seconds(1));
    }

    #[test]
    fn expired_until_yields_no_ticks() {
        let until = Utc::now() - Duration::seconds(5);
        let mut clock = WallClock::new(Duration::milliseconds(10), Some(until));
        assert!(clock.tick().is_none());
    }

    #[test]
    fn ticks_advance_until_the_bound() {
        let until = Utc::now() + Duration::milliseconds(120);
        let mut clock = WallClock::new(Duration::milliseconds(30), Some(until));

        let mut ticks = Vec::new();
        while let Some(timestamp) = clock.tick() {
            ticks.push(timestamp);
            assert!(ticks.len() < 50, "clock failed to stop");
        }

        assert!(!ticks.is_empty());
        for pair in ticks.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
