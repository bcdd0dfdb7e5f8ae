//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Trust bootstrap → Load fallbacks → Dispatch → Report
//!
//! Signals (signals.rs):
//!     SIGINT → Cancel run token → Remaining probes report "cancelled"
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then trust, then input, then probes
//! - Fatal errors abort before the first probe is dispatched

pub mod signals;
pub mod startup;

pub use startup::{run, run_checks, StartupError};
