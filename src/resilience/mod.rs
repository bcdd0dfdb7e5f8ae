//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Check against a fallback server:
//!     → timeouts.rs (hard deadline, tears down the probe's I/O on expiry)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every check has a deadline
//! - No retries: a failed check is the signal being measured

pub mod timeouts;
