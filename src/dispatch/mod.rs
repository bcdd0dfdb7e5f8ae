//! Worker pool subsystem.
//!
//! # Data Flow
//! ```text
//! Vec<ServerRecord>
//!     → pool.rs work queue (sized to the record count, closed after fill)
//!     → N long-lived workers (shared receiver, one record per dequeue)
//!     → ProbeExecutor::probe
//!     → results channel (bounded to N: backpressure on slow consumers)
//!     → ResultAggregator
//! ```
//!
//! # Design Decisions
//! - Exactly one outcome per record; outcomes arrive in completion order
//! - The results channel closes only after every worker has returned
//! - No retries at this layer; one attempt per record per run

pub mod pool;

pub use pool::Dispatcher;
