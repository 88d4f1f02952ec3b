//! Run reporting
//!
//! ## RunReporter Trait
//!
//! The driver announces each step through a `RunReporter`, which also owns
//! the sink that child output is forwarded into. `ConsoleReporter` prints the
//! command line of each case followed by its raw output, then a one-line
//! summary on stderr.

use std::io::{self, Write};
use std::time::Duration;

use super::invocation::Invocation;
use super::stage::StagedWorkspace;

/// Totals for one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cases: usize,
    pub bytes: u64,
    pub duration: Duration,
}

/// Trait for reporting run progress.
pub trait RunReporter {
    /// Called once the archive has been unpacked
    fn on_staged(&mut self, _staged: &StagedWorkspace) {}

    /// Called right before a case is launched
    fn on_case_start(&mut self, index: usize, invocation: &Invocation);

    /// Sink receiving the child's stdout for the case in progress
    fn case_output(&mut self) -> &mut dyn Write;

    /// Called after teardown
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Default console reporter.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RunReporter for ConsoleReporter<W> {
    fn on_staged(&mut self, staged: &StagedWorkspace) {
        eprintln!("staged {} member(s) into {}", staged.members, staged.root.display());
    }

    fn on_case_start(&mut self, _index: usize, invocation: &Invocation) {
        // Console output is best effort; a closed stdout shows up as a Stream error on the next chunk.
        let _ = writeln!(self.out, "{}", invocation);
        let _ = self.out.flush();
    }

    fn case_output(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        eprintln!(
            "====== {} case(s), {} byte(s) of output in {:.2}s ======",
            summary.cases,
            summary.bytes,
            summary.duration.as_secs_f64()
        );
    }
}
