//! OS signal handling.
//!
//! # Responsibilities
//! - Translate Ctrl+C into cancellation of the run token
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Cancellation still yields one outcome per record, marked cancelled

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancel `cancel` on the first interrupt signal.
pub fn cancel_on_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    tracing::warn!("Interrupt received, cancelling remaining checks");
                    cancel.cancel();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Unable to listen for interrupt signal");
                }
            },
        }
    })
}
