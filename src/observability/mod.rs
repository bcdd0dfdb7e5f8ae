//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → stderr (operator at a terminal)
//!     → JSON log file (cron runs, log shipping)
//! ```
//!
//! # Design Decisions
//! - The probe report goes to stdout; logs never interleave with it
//! - Each run carries a run ID span for correlation across log lines
//! - Per-record detail is debug level to keep cron logs small

pub mod logging;

pub use logging::{init_logging, LoggingError};
