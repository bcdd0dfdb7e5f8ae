//! Concurrent verifier for proxy fallback servers.

pub mod bootstrap;
pub mod config;
pub mod dialer;
pub mod dispatch;
pub mod fallback;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod report;
pub mod resilience;

pub use config::schema::CheckConfig;
pub use dispatch::Dispatcher;
pub use probe::ProbeExecutor;
pub use report::ResultAggregator;
