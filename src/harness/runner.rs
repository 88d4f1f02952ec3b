//! Coverage run driver
//!
//! Stage the archive, then for each discovered case build its invocation and
//! run it to completion, one at a time, and finally remove the working
//! directory. Any error aborts the run on the spot. Teardown only happens after
//! a clean pass over every case, so an aborted run leaves the staged inputs on
//! disk where they can be inspected.

use std::fmt;
use std::time::Instant;

use super::config::{InstrumentationConfig, RunConfig};
use super::discovery::enumerate_cases;
use super::error::HarnessResult;
use super::executor::CaseExecutor;
use super::invocation::Invocation;
use super::report::{RunReporter, RunSummary};
use super::stage::stage_archive;
use super::teardown::teardown;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Staged,
    /// Case with this zero-based index is executing
    Running(usize),
    Drained,
    TornDown,
    Aborted,
}

impl RunState {
    /// True once the working directory has been populated and not yet removed.
    pub fn holds_workdir(self) -> bool {
        matches!(self, RunState::Staged | RunState::Running(_) | RunState::Drained)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Staged => write!(f, "staged"),
            RunState::Running(i) => write!(f, "running case #{}", i + 1),
            RunState::Drained => write!(f, "drained"),
            RunState::TornDown => write!(f, "torn down"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}

fn advance(state: &mut RunState, next: RunState) {
    tracing::debug!(from = %state, to = %next, "run state");
    *state = next;
}

/// Run every case of `run.archive` through `executor`.
pub fn run_coverage<E, R>(
    run: &RunConfig,
    instrumentation: &InstrumentationConfig,
    executor: &mut E,
    reporter: &mut R,
) -> HarnessResult<RunSummary>
where
    E: CaseExecutor + ?Sized,
    R: RunReporter + ?Sized,
{
    let mut state = RunState::Idle;
    let result = drive(run, instrumentation, executor, reporter, &mut state);

    if let Err(e) = &result {
        tracing::error!(kind = e.kind(), state = %state, "run aborted");
        if state.holds_workdir() {
            tracing::warn!(
                workdir = %run.workdir.display(),
                "working directory was not removed; delete it manually once inspected"
            );
        }
        advance(&mut state, RunState::Aborted);
    }
    result
}

fn drive<E, R>(
    run: &RunConfig,
    instrumentation: &InstrumentationConfig,
    executor: &mut E,
    reporter: &mut R,
    state: &mut RunState,
) -> HarnessResult<RunSummary>
where
    E: CaseExecutor + ?Sized,
    R: RunReporter + ?Sized,
{
    let start = Instant::now();

    let staged = stage_archive(&run.archive, &run.workdir)?;
    advance(state, RunState::Staged);
    reporter.on_staged(&staged);

    let mut cases = 0;
    let mut bytes = 0;
    for case in enumerate_cases(&run.workdir)? {
        let case = case?;
        let invocation = Invocation::build(run, instrumentation, &case)?;

        advance(state, RunState::Running(cases));
        tracing::info!(input = %case.input.display(), output = %invocation.output.display(), "running case");
        reporter.on_case_start(cases, &invocation);

        let report = executor.execute(&invocation, reporter.case_output())?;

        cases += 1;
        bytes += report.bytes;
    }
    advance(state, RunState::Drained);

    teardown(&run.workdir)?;
    advance(state, RunState::TornDown);

    let summary = RunSummary {
        cases,
        bytes,
        duration: start.elapsed(),
    };
    tracing::info!(cases, bytes, "run complete");
    reporter.on_run_complete(&summary);
    Ok(summary)
}
