//! Shared fakes for the orchestrator and UI-channel tests.
//!
//! Every port is backed by memory: commands are answered by a closure and
//! recorded, files live in a shared map, the registrar keeps its records
//! in a vector.

#![allow(clippy::expect_used, clippy::unwrap_used, dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;
#[cfg(windows)]
use std::os::windows::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use gateway_common::UiEvent;
use gatewayctl::application::ports::{
    Capabilities, CommandRunner, Confirmer, DnsResolver, Downloader, EventSink, FileHasher,
    Firewall, LocalFs, PortMapper, PublicAddress, RegistrarApi, RuntimeHost,
};
use gatewayctl::domain::challenge::RegistrarCredentials;
use gatewayctl::domain::config::{GatewayConfig, GatewayPaths};
use gatewayctl::domain::network::{MappingError, PortMapping};
use gatewayctl::domain::registrar::{HostRecord, RegisteredDomain};

pub const PUBLIC_IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 7);

pub const MANIFEST: &str = "services:\n  core: {}\n  envoy: {}\n  observer: {}\n  redis: {}\nnetworks:\n  ar-io-network: {}\n";
pub const MANIFEST_V2: &str = "services:\n  core: {}\n  envoy: {}\n  observer: {}\n  redis: {}\n  litestream: {}\nnetworks:\n  ar-io-network: {}\n";

pub const RUNNING: &str = "core: Up 2 minutes\nenvoy: Up 2 minutes\nobserver: Up 2 minutes\nredis: Up 2 minutes\n";

// ── Output helpers ────────────────────────────────────────────────────────────

#[cfg(unix)]
fn status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &str) -> Output {
    Output {
        status: status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(stderr: &str) -> Output {
    Output {
        status: status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// A healthy Docker host with a fully running group.
pub fn healthy_docker(cmd: &str) -> Output {
    if cmd == "docker --version" {
        ok_output("Docker version 24.0.7, build afdd53b\n")
    } else if cmd.starts_with("docker ps") {
        ok_output(RUNNING)
    } else {
        ok_output("")
    }
}

// ── Command runner ───────────────────────────────────────────────────────────

type Respond = Box<dyn Fn(&str) -> Output>;

/// Answers each command line through a closure and records it.
pub struct ScriptRunner {
    respond: Respond,
    calls: RefCell<Vec<String>>,
}

impl ScriptRunner {
    pub fn new(respond: impl Fn(&str) -> Output + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            calls: RefCell::new(Vec::new()),
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

    /// Position of the first call containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c.contains(needle))
    }

    fn answer(&self, program: &str, args: &[&str]) -> Output {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(line.clone());
        (self.respond)(&line)
    }
}

impl CommandRunner for ScriptRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        Ok(self.answer(program, args))
    }

    async fn run_with_timeout(&self, program: &str, args: &[&str], _: Duration) -> Result<Output> {
        Ok(self.answer(program, args))
    }

    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        _: &[(&str, &str)],
        _: Duration,
    ) -> Result<Output> {
        Ok(self.answer(program, args))
    }
}

// ── Runtime host ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct QuietHost {
    pub installs: RefCell<Vec<PathBuf>>,
}

impl RuntimeHost for QuietHost {
    async fn start_daemon(&self) -> Result<()> {
        Ok(())
    }

    async fn run_installer(&self, installer: &Path) -> Result<()> {
        self.installs.borrow_mut().push(installer.to_path_buf());
        Ok(())
    }
}

// ── Filesystem ───────────────────────────────────────────────────────────────

/// In-memory files, shared with [`FakeHttp`] so downloads land here.
#[derive(Clone, Default)]
pub struct MemFs {
    files: Rc<RefCell<BTreeMap<PathBuf, String>>>,
}

impl MemFs {
    pub fn put(&self, path: impl Into<PathBuf>, content: &str) {
        self.files
            .borrow_mut()
            .insert(path.into(), content.to_string());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }
}

impl LocalFs for MemFs {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
            || self.files.borrow().keys().any(|k| k.starts_with(path))
    }

    fn create_dir_all(&self, _: &Path) -> Result<()> {
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.get(path)
            .ok_or_else(|| anyhow!("{} not found", path.display()))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        self.put(path, content);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self
            .files
            .borrow_mut()
            .remove(from)
            .ok_or_else(|| anyhow!("{} not found", from.display()))?;
        self.put(to, &content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.files
            .borrow_mut()
            .remove(path)
            .map(drop)
            .ok_or_else(|| anyhow!("{} not found", path.display()))
    }

    fn set_permissions(&self, _: &Path, _: u32) -> Result<()> {
        Ok(())
    }
}

impl FileHasher for MemFs {
    /// Content stands in for the digest; equal content, equal "hash".
    fn sha256_file(&self, path: &Path) -> Result<String> {
        self.read_to_string(path)
    }
}

// ── HTTP ─────────────────────────────────────────────────────────────────────

/// Serves one body for every URL.
pub struct FakeHttp {
    pub fs: MemFs,
    pub status: u16,
    pub body: String,
}

impl Downloader for FakeHttp {
    async fn download(&self, _: &str, dest: &Path) -> Result<u16> {
        if self.status == 200 {
            self.fs.put(dest, &self.body);
        }
        Ok(self.status)
    }
}

impl PublicAddress for FakeHttp {
    async fn public_ipv4(&self) -> Result<Ipv4Addr> {
        Ok(PUBLIC_IP)
    }
}

// ── DNS and registrar ────────────────────────────────────────────────────────

/// Resolves every host to the same address.
pub struct FixedDns(pub Vec<Ipv4Addr>);

impl DnsResolver for FixedDns {
    async fn resolve_a(&self, _: &str) -> Result<Vec<Ipv4Addr>> {
        Ok(self.0.clone())
    }

    async fn lookup_txt(&self, _: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct MemRegistrar {
    pub records: RefCell<Vec<HostRecord>>,
    pub sets: RefCell<usize>,
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
        *self.records.borrow_mut() = records.to_vec();
        *self.sets.borrow_mut() += 1;
        Ok(())
    }
}

// ── Network ──────────────────────────────────────────────────────────────────

pub struct OpenFirewall;

impl Firewall for OpenFirewall {
    async fn has_rule(&self, _: u16) -> Result<bool> {
        Ok(true)
    }

    async fn allow_port(&self, _: u16, _: &str) -> Result<()> {
        Ok(())
    }
}

/// Router that forwards everything, or nothing.
pub struct FakeRouter {
    pub accept: bool,
}

impl PortMapper for FakeRouter {
    async fn add_mapping(&self, _: &PortMapping) -> Result<(), MappingError> {
        if self.accept {
            Ok(())
        } else {
            Err(MappingError::Other("No IGD UPnP Device found on the network".to_string()))
        }
    }
}

// ── Front-end ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    events: RefCell<Vec<UiEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }

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

    /// Classification codes attached to error lines, in order.
    pub fn failure_kinds(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                UiEvent::LogLine { kind, .. } => kind.clone(),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        self.events.borrow_mut().push(event);
    }
}

pub struct Answer(pub bool);

impl Confirmer for Answer {
    async fn confirm(&self, _: &str, _: &str) -> Result<bool> {
        Ok(self.0)
    }
}

// ── Capability set ───────────────────────────────────────────────────────────

pub struct FakeCaps<C, S> {
    pub runner: ScriptRunner,
    pub host: QuietHost,
    pub fs: MemFs,
    pub http: FakeHttp,
    pub dns: FixedDns,
    pub registrar: MemRegistrar,
    pub firewall: OpenFirewall,
    pub router: FakeRouter,
    pub confirmer: C,
    pub sink: S,
}

impl<C: Confirmer, S: EventSink> FakeCaps<C, S> {
    /// Healthy host, published manifest [`MANIFEST`], DNS pointing here.
    pub fn new(confirmer: C, sink: S) -> Self {
        let fs = MemFs::default();
        Self {
            runner: ScriptRunner::new(healthy_docker),
            host: QuietHost::default(),
            http: FakeHttp {
                fs: fs.clone(),
                status: 200,
                body: MANIFEST.to_string(),
            },
            fs,
            dns: FixedDns(vec![PUBLIC_IP]),
            registrar: MemRegistrar::default(),
            firewall: OpenFirewall,
            router: FakeRouter { accept: true },
            confirmer,
            sink,
        }
    }

    pub fn with_runner(mut self, respond: impl Fn(&str) -> Output + 'static) -> Self {
        self.runner = ScriptRunner::new(respond);
        self
    }
}

impl<C: Confirmer, S: EventSink> Capabilities for FakeCaps<C, S> {
    type Runner = ScriptRunner;
    type Host = QuietHost;
    type Fs = MemFs;
    type Http = FakeHttp;
    type Dns = FixedDns;
    type Registrar = MemRegistrar;
    type Firewall = OpenFirewall;
    type Router = FakeRouter;
    type Confirm = C;
    type Sink = S;

    fn runner(&self) -> &Self::Runner {
        &self.runner
    }

    fn host(&self) -> &Self::Host {
        &self.host
    }

    fn fs(&self) -> &Self::Fs {
        &self.fs
    }

    fn http(&self) -> &Self::Http {
        &self.http
    }

    fn dns(&self) -> &Self::Dns {
        &self.dns
    }

    fn registrar(&self) -> &Self::Registrar {
        &self.registrar
    }

    fn firewall(&self) -> &Self::Firewall {
        &self.firewall
    }

    fn router(&self) -> &Self::Router {
        &self.router
    }

    fn confirmer(&self) -> &Self::Confirm {
        &self.confirmer
    }

    fn sink(&self) -> &Self::Sink {
        &self.sink
    }
}

pub fn node_paths() -> GatewayPaths {
    GatewayPaths::new("/node")
}

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        node_dir: Some(PathBuf::from("/node")),
        ..GatewayConfig::default()
    }
}
