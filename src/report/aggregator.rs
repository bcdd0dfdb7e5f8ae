//! Outcome stream rendering.

use std::io::{self, Write};
use tokio::sync::mpsc;
use crate::fallback::ProbeOutcome;

pub const FAILURE_PREFIX: &str = "[failed fallback check]";
pub const OUTPUT_PREFIX: &str = "[output]";

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub ok: usize,
    pub failed: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.ok + self.failed
    }
}

/// Writes outcomes to an output stream in arrival order.
pub struct ResultAggregator<W> {
    out: W,
    verbose: bool,
    report_success: bool,
}

impl<W: Write> ResultAggregator<W> {
    pub fn new(out: W, verbose: bool, report_success: bool) -> Self {
        Self {
            out,
            verbose,
            report_success,
        }
    }

    /// Render one outcome and its diagnostics.
    pub fn record(&mut self, outcome: &ProbeOutcome) -> io::Result<()> {
        match &outcome.error {
            Some(error) => {
                writeln!(self.out, "{} {}: {}", FAILURE_PREFIX, outcome.address, error)?;
            }
            None if self.report_success => {
                writeln!(self.out, "Fallback {} OK.", outcome.address)?;
            }
            None => {}
        }

        if self.verbose {
            for message in &outcome.diagnostics {
                writeln!(self.out, "{} {}", OUTPUT_PREFIX, message)?;
            }
        }
        self.out.flush()
    }

    /// Drain the outcome stream until it closes.
    pub async fn consume(mut self, mut outcomes: mpsc::Receiver<ProbeOutcome>) -> io::Result<Summary> {
        let mut summary = Summary::default();
        while let Some(outcome) = outcomes.recv().await {
            if outcome.is_success() {
                summary.ok += 1;
            } else {
                summary.failed += 1;
            }
            self.record(&outcome)?;
        }
        Ok(summary)
    }
}
