#![forbid(unsafe_code)]
//! Memory-check coverage harness
//!
//! Stages an archive of test inputs, runs a target executable under valgrind
//! once per input, streams the tool's output, and removes the staged files.
//! There is no pass/fail verdict; the harness exists to surface memory
//! diagnostics over a corpus.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod harness;
pub mod version;

pub use harness::{
    HarnessError, HarnessResult, InstrumentationConfig, Invocation, RunConfig, RunSummary, TestCase, run_coverage,
    strip_extension,
};
