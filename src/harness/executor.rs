//! Case execution boundary
//!
//! The run driver only talks to a `CaseExecutor`, which keeps subprocess
//! handling out of the orchestration logic and lets the driver be exercised
//! without valgrind installed. `InstrumentedExecutor` is the real thing.

use std::io::Write;

use super::error::HarnessResult;
use super::invocation::Invocation;
use super::process::{DrainReport, run_invocation};

/// Runs one assembled invocation to completion.
pub trait CaseExecutor {
    /// Execute `invocation`, forwarding everything it prints into `sink`.
    fn execute(&mut self, invocation: &Invocation, sink: &mut dyn Write) -> HarnessResult<DrainReport>;
}

/// Spawns the invocation as a real child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstrumentedExecutor;

impl CaseExecutor for InstrumentedExecutor {
    fn execute(&mut self, invocation: &Invocation, sink: &mut dyn Write) -> HarnessResult<DrainReport> {
        run_invocation(invocation, sink)
    }
}
