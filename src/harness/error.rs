//! Error taxonomy for a coverage run.
//!
//! None of these are recovered locally: each one aborts the run. The variants
//! carry the path or program involved so the CLI can print a useful diagnostic
//! without further context.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while staging, enumerating, running, or tearing down.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to extract archive '{}': {source}", archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot traverse '{}': {message}", root.display())]
    Traversal { root: PathBuf, message: String },

    /// The case file name is too short to drop its 4-character suffix.
    #[error("cannot derive an output path from '{}': file name must be longer than 4 characters", input.display())]
    OutputPath { input: PathBuf },

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("output stream of '{program}' failed: {source}")]
    Stream {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove working directory '{}': {source}", path.display())]
    Teardown {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    /// Short, stable name of the failure class (used in log fields).
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::Extraction { .. } => "extraction",
            HarnessError::Traversal { .. } => "traversal",
            HarnessError::OutputPath { .. } => "output-path",
            HarnessError::Launch { .. } => "launch",
            HarnessError::Stream { .. } => "stream",
            HarnessError::Teardown { .. } => "teardown",
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
