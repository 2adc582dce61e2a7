//! Core domain types and logic.

pub mod bar;
pub mod error;
pub mod ledger;
pub mod order;
pub mod resolution;
pub mod run_log;
pub mod series;
pub mod strategy;
pub mod trader;
