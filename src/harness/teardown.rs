//! Removal of the staged working directory

use std::fs;
use std::path::Path;

use super::error::{HarnessError, HarnessResult};

/// Recursively delete `dir` and everything under it.
pub fn teardown(dir: &Path) -> HarnessResult<()> {
    fs::remove_dir_all(dir).map_err(|source| HarnessError::Teardown {
        path: dir.to_path_buf(),
        source,
    })?;
    tracing::debug!(dir = %dir.display(), "removed working directory");
    Ok(())
}
