//! `ArtifactWriter` over any `LocalFs`: compare, then write only on change.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{ArtifactWriter, LocalFs};
use crate::domain::artifact::{Artifact, WriteOutcome};

const EXECUTABLE_MODE: u32 = 0o755;

/// Replace `path` by writing a sibling temp file and renaming it over.
///
/// # Errors
///
/// Returns an error if the temp file cannot be written or renamed.
pub fn write_atomic(fs: &impl LocalFs, path: &Path, contents: &str) -> Result<()> {
    replace_file(fs, path, contents, None)
}

/// `write_atomic` that also applies `mode` to the temp file before the rename.
fn replace_file(fs: &impl LocalFs, path: &Path, contents: &str, mode: Option<u32>) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.write(&tmp, contents)?;
    if let Some(mode) = mode {
        if let Err(e) = fs.set_permissions(&tmp, mode) {
            let _ = fs.remove_file(&tmp);
            return Err(e);
        }
    }
    if let Err(e) = fs.rename(&tmp, path) {
        let _ = fs.remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

impl<T: LocalFs> ArtifactWriter for T {
    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if self.exists(path) {
            return Ok(());
        }
        self.create_dir_all(path)
    }

    fn write_artifact(&self, artifact: &Artifact) -> Result<WriteOutcome> {
        let current = if self.exists(&artifact.path) {
            self.read_to_string(&artifact.path).ok()
        } else {
            None
        };
        if current.as_deref() == Some(artifact.contents.as_str()) {
            return Ok(WriteOutcome::Unchanged);
        }
        let mode = artifact.executable.then_some(EXECUTABLE_MODE);
        replace_file(self, &artifact.path, &artifact.contents, mode)?;
        Ok(WriteOutcome::Written)
    }
}
