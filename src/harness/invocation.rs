//! Per-case command construction
//!
//! Every case becomes one instrumented command line:
//!
//! ```text
//! <tool> <leak-check> <track-origins> <executable> -i <input> -o <output> -d <dimension> -t <report-type>
//! ```
//!
//! The output path is the input path with the last four characters of its file
//! name removed (`cases/a.bin` -> `cases/a`). This is a fixed-width cut, not
//! extension parsing: `x.gz` loses its whole name and `x.jpeg` keeps a dot.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use super::config::{InstrumentationConfig, RunConfig};
use super::discovery::TestCase;
use super::error::{HarnessError, HarnessResult};

/// Number of trailing file-name characters dropped to form the output path.
pub const SUFFIX_LEN: usize = 4;

pub const KEY_PATH_INPUT: &str = "-i";
pub const KEY_PATH_OUTPUT: &str = "-o";
pub const KEY_DIMENSION: &str = "-d";
pub const KEY_REPORT_TYPE: &str = "-t";

/// Drop the last [`SUFFIX_LEN`] characters of `input`'s file name.
///
/// UTF-8 names are cut by characters. On unix a name that is not UTF-8 is cut
/// by bytes instead, the same way the raw name is stored on disk.
///
/// ## Errors
///
/// Returns `OutputPath` when the file name has `SUFFIX_LEN` characters or
/// fewer, since the cut would leave nothing (or point at the parent
/// directory). Outside unix a non-UTF-8 name is also rejected.
pub fn strip_extension(input: &Path) -> HarnessResult<PathBuf> {
    let too_short = || HarnessError::OutputPath {
        input: input.to_path_buf(),
    };

    let name = input.file_name().ok_or_else(too_short)?;
    let stem = match name.to_str() {
        Some(name) => {
            let keep = name.chars().count().checked_sub(SUFFIX_LEN).filter(|&n| n > 0).ok_or_else(too_short)?;
            OsString::from(name.chars().take(keep).collect::<String>())
        }
        None => strip_raw_bytes(name).ok_or_else(too_short)?,
    };

    Ok(input.with_file_name(stem))
}

#[cfg(unix)]
fn strip_raw_bytes(name: &OsStr) -> Option<OsString> {
    use std::os::unix::ffi::OsStrExt;

    let bytes = name.as_bytes();
    let keep = bytes.len().checked_sub(SUFFIX_LEN).filter(|&n| n > 0)?;
    Some(OsStr::from_bytes(&bytes[..keep]).to_os_string())
}

#[cfg(not(unix))]
fn strip_raw_bytes(_name: &OsStr) -> Option<OsString> {
    None
}

/// A fully assembled instrumented command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program actually spawned (the instrumentation tool)
    pub program: String,
    /// Everything after the program, in order
    pub args: Vec<OsString>,
    /// Output path handed to the target with `-o`
    pub output: PathBuf,
}

impl Invocation {
    /// Build the command for one case.
    pub fn build(run: &RunConfig, instrumentation: &InstrumentationConfig, case: &TestCase) -> HarnessResult<Self> {
        let output = strip_extension(&case.input)?;

        let args = vec![
            OsString::from(&instrumentation.leak_check_flag),
            OsString::from(&instrumentation.track_origins_flag),
            run.executable.clone().into_os_string(),
            OsString::from(KEY_PATH_INPUT),
            case.input.clone().into_os_string(),
            OsString::from(KEY_PATH_OUTPUT),
            output.clone().into_os_string(),
            OsString::from(KEY_DIMENSION),
            OsString::from(&instrumentation.dimension),
            OsString::from(KEY_REPORT_TYPE),
            OsString::from(&instrumentation.report_type),
        ];

        Ok(Self {
            program: instrumentation.tool.clone(),
            args,
            output,
        })
    }

    /// All tokens including the program, as displayed and logged.
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens().join(" "))
    }
}
