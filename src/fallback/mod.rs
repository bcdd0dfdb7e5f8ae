//! Fallback server data model.
//!
//! # Data Flow
//! ```text
//! fallbacks.json (array of arrays)
//!     → loader.rs (read, deserialize, flatten, validate)
//!     → ServerRecord (immutable, moved into the work queue)
//!     → record.rs Protocol::of (transport precedence)
//!     → probe executor
//!     → outcome.rs ProbeOutcome (one per record)
//! ```
//!
//! # Design Decisions
//! - Records are values: workers own their copy, nothing is mutated in place
//! - Protocol derivation is a pure function, testable without networking
//! - Malformed input is fatal; there is no partial processing

pub mod loader;
pub mod outcome;
pub mod record;

pub use loader::{load_fallbacks, FallbackError};
pub use outcome::ProbeOutcome;
pub use record::{Protocol, ServerRecord};
