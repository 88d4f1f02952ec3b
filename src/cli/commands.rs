//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::PathBuf;

use crate::harness::{ConsoleReporter, InstrumentationConfig, InstrumentedExecutor, RunConfig, run_coverage};

use super::{CliError, CliResult, ExitCode};

/// Stage `archive` into `workdir` and run `executable` under valgrind for every case.
pub fn cover(executable: PathBuf, archive: PathBuf, workdir: PathBuf) -> CliResult<ExitCode> {
    if workdir.is_file() {
        return Err(CliError::failure(format!(
            "Error: working directory '{}' is an existing file",
            workdir.display()
        )));
    }
    if workdir.exists() {
        tracing::warn!(
            workdir = %workdir.display(),
            "working directory already exists; it will be removed after the run"
        );
    }

    let run = RunConfig::new(executable, archive, workdir);
    let instrumentation = InstrumentationConfig::default();

    let mut reporter = ConsoleReporter::stdout();
    run_coverage(&run, &instrumentation, &mut InstrumentedExecutor, &mut reporter)?;

    Ok(ExitCode::SUCCESS)
}
