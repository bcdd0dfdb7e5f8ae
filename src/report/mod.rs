//! Operator-facing reporting.
//!
//! Output lines are consumed by cron scripts, so the prefixes are stable:
//! `[failed fallback check] `, `Fallback ... OK.` and `[output] `.

pub mod aggregator;

pub use aggregator::{ResultAggregator, Summary};
