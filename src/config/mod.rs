//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → CheckConfig (validated, immutable)
//!     → passed by reference into startup, executor and aggregator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once validated; there are no process-wide globals
//! - All fields have defaults so a bare command line works
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{CheckConfig, CheckMode, ObservabilityConfig, TrustConfig, VerifyBodyMode, VerifyConfig};
pub use validation::{validate_config, ValidationError};
