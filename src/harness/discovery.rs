//! Case discovery over the staged working directory
//!
//! Every regular file below the root is one test case, as is every symlink
//! that does not resolve to a directory. The walk is lazy and single-pass.
//!
//! Each directory is read in full the moment the walk enters it. Targets write
//! their reports next to their inputs while the walk is still in progress, and
//! those files must never come back as new cases.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::{HarnessError, HarnessResult};

/// One discovered input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Path of the input file inside the staged tree
    pub input: PathBuf,
}

impl TestCase {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self { input: input.into() }
    }
}

/// Lazy iterator over the cases under one root.
pub struct CaseIter {
    root: PathBuf,
    walker: walkdir::IntoIter,
}

impl Iterator for CaseIter {
    type Item = HarnessResult<TestCase>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_file() {
                        return Some(Ok(TestCase::new(entry.into_path())));
                    }
                    if file_type.is_symlink() {
                        if entry.path().is_dir() {
                            tracing::debug!(path = %entry.path().display(), "skipping symlink to directory");
                            continue;
                        }
                        return Some(Ok(TestCase::new(entry.into_path())));
                    }
                }
                Err(e) => {
                    return Some(Err(HarnessError::Traversal {
                        root: self.root.clone(),
                        message: e.to_string(),
                    }));
                }
            }
        }
    }
}

/// Start enumerating cases below `root`.
///
/// Fails up front if `root` is missing or is not a directory; errors met
/// during the walk are yielded as items.
#[tracing::instrument(skip_all, fields(root = %root.display()))]
pub fn enumerate_cases(root: &Path) -> HarnessResult<CaseIter> {
    let metadata = root.metadata().map_err(|e| HarnessError::Traversal {
        root: root.to_path_buf(),
        message: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(HarnessError::Traversal {
            root: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    tracing::debug!("walking staged cases");
    Ok(CaseIter {
        root: root.to_path_buf(),
        // Sorting makes walkdir collect a directory's entries before yielding any of them.
        walker: WalkDir::new(root).sort_by_file_name().into_iter(),
    })
}
