//! Concrete adapter implementations for ports.

pub mod cryptocompare;
pub mod csv_series;
pub mod file_config;
pub mod live_source;
pub mod replay_clock;
pub mod replay_source;
pub mod snapshot;
pub mod wall_clock;
