//! Generated files and the result of materializing them.

use std::path::PathBuf;

/// A file rendered from a template, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
    /// Mark the file executable (hook scripts).
    pub executable: bool,
}

impl Artifact {
    #[must_use]
    pub fn new(path: PathBuf, contents: String) -> Self {
        Self {
            path,
            contents,
            executable: false,
        }
    }

    #[must_use]
    pub fn executable(path: PathBuf, contents: String) -> Self {
        Self {
            path,
            contents,
            executable: true,
        }
    }
}

/// Whether writing an artifact changed anything on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Existing content already matched.
    Unchanged,
    Written,
}
