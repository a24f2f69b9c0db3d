//! Shared test helpers for service tests.
//!
//! Provides cross-platform `exit_status()`, output constructors and small
//! hand-written fakes for the ports every service touches.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use gateway_common::UiEvent;

use crate::application::ports::{
    CommandRunner, Confirmer, Downloader, EventSink, FileHasher, LocalFs, RegistrarApi,
};
use crate::domain::challenge::RegistrarCredentials;
use crate::domain::manifest::sha256_hex;
use crate::domain::registrar::{HostRecord, RegisteredDomain};

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    std::process::ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Command runner ───────────────────────────────────────────────────────────

/// Runner answering from a closure over the joined command line, e.g.
/// `"docker info"`. Every call is recorded along with any extra env keys.
pub struct FnRunner<F> {
    respond: F,
    calls: RefCell<Vec<String>>,
    env_keys: RefCell<Vec<String>>,
}

impl<F: Fn(&str) -> Result<Output>> FnRunner<F> {
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: RefCell::new(Vec::new()),
            env_keys: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn env_keys(&self) -> Vec<String> {
        self.env_keys.borrow().clone()
    }

    fn call(&self, program: &str, args: &[&str]) -> Result<Output> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(line.clone());
        (self.respond)(&line)
    }
}

impl<F: Fn(&str) -> Result<Output>> CommandRunner for FnRunner<F> {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.call(program, args)
    }

    async fn run_with_timeout(&self, program: &str, args: &[&str], _: Duration) -> Result<Output> {
        self.call(program, args)
    }

    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        _: Duration,
    ) -> Result<Output> {
        self.env_keys
            .borrow_mut()
            .extend(env.iter().map(|(k, _)| (*k).to_string()));
        self.call(program, args)
    }
}

// ── Event sink ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    events: RefCell<Vec<UiEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }

    /// Messages of every `log-line` event, in order.
    pub fn messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                UiEvent::LogLine { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        self.events.borrow_mut().push(event);
    }
}

// ── Confirmer ────────────────────────────────────────────────────────────────

/// Always gives the same answer and counts how often it was asked.
pub struct FixedConfirmer {
    answer: bool,
    asked: Cell<usize>,
}

impl FixedConfirmer {
    pub fn yes() -> Self {
        Self {
            answer: true,
            asked: Cell::new(0),
        }
    }

    pub fn no() -> Self {
        Self {
            answer: false,
            asked: Cell::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.get()
    }
}

impl Confirmer for FixedConfirmer {
    async fn confirm(&self, _: &str, _: &str) -> Result<bool> {
        self.asked.set(self.asked.get() + 1);
        Ok(self.answer)
    }
}

// ── In-memory filesystem ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemFs {
    files: RefCell<BTreeMap<PathBuf, String>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
    modes: RefCell<BTreeMap<PathBuf, u32>>,
    writes: Cell<usize>,
    renames: Cell<usize>,
}

impl MemFs {
    pub fn with_file(self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(path.into(), content.to_string());
        self
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn mode(&self, path: &Path) -> Option<u32> {
        self.modes.borrow().get(path).copied()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn renames(&self) -> usize {
        self.renames.get()
    }
}

impl LocalFs for MemFs {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.dirs.borrow().contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.contents(path)
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self
            .files
            .borrow_mut()
            .remove(from)
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", from.display()))?;
        self.files.borrow_mut().insert(to.to_path_buf(), content);
        let mut modes = self.modes.borrow_mut();
        if let Some(mode) = modes.remove(from) {
            modes.insert(to.to_path_buf(), mode);
        }
        self.renames.set(self.renames.get() + 1);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        self.modes.borrow_mut().insert(path.to_path_buf(), mode);
        Ok(())
    }
}

impl FileHasher for MemFs {
    fn sha256_file(&self, path: &Path) -> Result<String> {
        Ok(sha256_hex(self.read_to_string(path)?.as_bytes()))
    }
}

// ── Downloader ───────────────────────────────────────────────────────────────

/// Serves a fixed status and body, writing into a shared `MemFs`.
pub struct StubDownloader<'a> {
    pub fs: &'a MemFs,
    pub status: u16,
    pub body: String,
    pub fail: bool,
}

impl Downloader for StubDownloader<'_> {
    async fn download(&self, _: &str, dest: &Path) -> Result<u16> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        if self.status == 200 {
            self.fs.write(dest, &self.body)?;
        }
        Ok(self.status)
    }
}

// ── Registrar ────────────────────────────────────────────────────────────────

/// In-memory record set. `set_hosts` yields once before storing so
/// concurrent read-modify-write callers interleave like real network calls.
#[derive(Default)]
pub struct MemRegistrar {
    pub records: RefCell<Vec<HostRecord>>,
    sets: Cell<usize>,
}

impl MemRegistrar {
    pub fn with_records(records: Vec<HostRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            sets: Cell::new(0),
        }
    }

    pub fn sets(&self) -> usize {
        self.sets.get()
    }
}

impl RegistrarApi for MemRegistrar {
    async fn get_hosts(
        &self,
        _: &RegistrarCredentials,
        _: &RegisteredDomain,
    ) -> Result<Vec<HostRecord>> {
        Ok(self.records.borrow().clone())
    }

    async fn set_hosts(
        &self,
        _: &RegistrarCredentials,
        _: &RegisteredDomain,
        records: &[HostRecord],
    ) -> Result<()> {
        tokio::task::yield_now().await;
        self.sets.set(self.sets.get() + 1);
        *self.records.borrow_mut() = records.to_vec();
        Ok(())
    }
}
