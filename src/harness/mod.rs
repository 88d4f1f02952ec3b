//! Memory-check coverage harness
//!
//! Runs a target executable under an instrumentation tool once for every input
//! file in a case archive. Nothing is judged: the point is to surface the
//! tool's leak and invalid-access reports across the whole corpus.
//!
//! ## Modules
//!
//! - `config` - Run paths and fixed instrumentation constants
//! - `stage` - Archive extraction into the working directory
//! - `discovery` - Recursive case enumeration over a per-directory snapshot
//! - `invocation` - Output-path derivation and command assembly
//! - `process` - Child spawning and stdout draining
//! - `executor` - `CaseExecutor` boundary used by the driver
//! - `report` - `RunReporter` trait and console output
//! - `teardown` - Working directory removal
//! - `runner` - The sequential run driver

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod invocation;
pub mod process;
pub mod report;
pub mod runner;
pub mod stage;
pub mod teardown;

pub use config::{InstrumentationConfig, RunConfig};
pub use discovery::{CaseIter, TestCase, enumerate_cases};
pub use error::{HarnessError, HarnessResult};
pub use executor::{CaseExecutor, InstrumentedExecutor};
pub use invocation::{Invocation, strip_extension};
pub use process::{DrainReport, run_invocation};
pub use report::{ConsoleReporter, RunReporter, RunSummary};
pub use runner::{RunState, run_coverage};
pub use stage::{Compression, StagedWorkspace, stage_archive};
pub use teardown::teardown;
