//! Port traits the engine consumes.

pub mod asset_source;
pub mod broker_port;
pub mod clock_port;
pub mod config_port;
