//! Run configuration for the coverage harness
//!
//! `RunConfig` holds the three paths given on the command line.
//! `InstrumentationConfig` holds the fixed tool and target flags that every
//! invocation shares; its defaults match the valgrind memcheck setup.

use std::path::PathBuf;

/// Paths supplied once at startup. Never mutated during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Target executable under test
    pub executable: PathBuf,
    /// Archive holding the test-case inputs
    pub archive: PathBuf,
    /// Scratch directory the archive is staged into
    pub workdir: PathBuf,
}

impl RunConfig {
    pub fn new(executable: impl Into<PathBuf>, archive: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            archive: archive.into(),
            workdir: workdir.into(),
        }
    }
}

/// Instrumentation tool and per-run constants passed to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationConfig {
    /// Instrumentation program (looked up on `PATH`)
    pub tool: String,
    /// Flag enabling leak checking
    pub leak_check_flag: String,
    /// Flag enabling origin tracking of uninitialised values
    pub track_origins_flag: String,
    /// Value passed with `-d`
    pub dimension: String,
    /// Value passed with `-t`
    pub report_type: String,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            tool: "valgrind".to_string(),
            leak_check_flag: "--leak-check=yes".to_string(),
            track_origins_flag: "--track-origins=yes".to_string(),
            dimension: "2".to_string(),
            report_type: "eti".to_string(),
        }
    }
}

impl InstrumentationConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instrumentation program
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Set the dimension constant
    pub fn with_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimension = dimension.into();
        self
    }

    /// Set the report-type constant
    pub fn with_report_type(mut self, report_type: impl Into<String>) -> Self {
        self.report_type = report_type.into();
        self
    }
}
