//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared wire types,
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use gateway_common::{LogLevel, UiEvent};

use crate::domain::artifact::{Artifact, WriteOutcome};
use crate::domain::challenge::RegistrarCredentials;
use crate::domain::config::GatewayConfig;
use crate::domain::error::ErrorKind;
use crate::domain::network::{MappingError, PortMapping};
use crate::domain::registrar::{HostRecord, RegisteredDomain};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
///
/// A process that exits non-zero is still `Ok`; callers inspect the status.
/// `Err` means the process could not be spawned or ran past its timeout, in
/// which case it has been killed and the error is a `GatewayError::Timeout`.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with the instance's default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;

    /// Run a program with extra environment variables set for the child only.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Event Sink Port ───────────────────────────────────────────────────────────

/// Where services report progress and state. Synchronous; emitting never blocks.
pub trait EventSink {
    fn emit(&self, event: UiEvent);

    fn info(&self, message: &str) {
        self.emit(UiEvent::log(LogLevel::Info, message));
    }

    fn warn(&self, message: &str) {
        self.emit(UiEvent::log(LogLevel::Warn, message));
    }

    fn error(&self, message: &str) {
        self.emit(UiEvent::log(LogLevel::Error, message));
    }

    /// Report a failed operation together with its classification.
    fn failure(&self, message: &str, kind: ErrorKind) {
        self.emit(UiEvent::failure(message, kind.as_str()));
    }
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn emit(&self, event: UiEvent) {
        (**self).emit(event);
    }
}

// ── Operator Confirmation Port ────────────────────────────────────────────────

/// Yes/no questions put to the operator before any drift is resolved or any
/// remote record is mutated.
#[allow(async_fn_in_trait)]
pub trait Confirmer {
    /// # Errors
    ///
    /// Returns an error if no answer can be obtained (no TTY, channel closed).
    async fn confirm(&self, title: &str, message: &str) -> Result<bool>;
}

impl<T: Confirmer + ?Sized> Confirmer for &T {
    async fn confirm(&self, title: &str, message: &str) -> Result<bool> {
        (**self).confirm(title, message).await
    }
}

// ── HTTP Ports ────────────────────────────────────────────────────────────────

/// Fetches remote files.
#[allow(async_fn_in_trait)]
pub trait Downloader {
    /// GET `url`. On HTTP 200 the body is written to `dest`; any other status
    /// is returned without touching `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if `dest` cannot be written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u16>;
}

/// Discovers the machine's public IPv4 address.
#[allow(async_fn_in_trait)]
pub trait PublicAddress {
    async fn public_ipv4(&self) -> Result<Ipv4Addr>;
}

// ── DNS Ports ─────────────────────────────────────────────────────────────────

#[allow(async_fn_in_trait)]
pub trait DnsResolver {
    /// A records for `host`. No timeout is applied here; callers bound it.
    async fn resolve_a(&self, host: &str) -> Result<Vec<Ipv4Addr>>;

    /// TXT values for `name` as returned by the resolver.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>>;
}

/// Registrar host-record API. `set_hosts` replaces the full record set.
#[allow(async_fn_in_trait)]
pub trait RegistrarApi {
    async fn get_hosts(
        &self,
        creds: &RegistrarCredentials,
        domain: &RegisteredDomain,
    ) -> Result<Vec<HostRecord>>;

    async fn set_hosts(
        &self,
        creds: &RegistrarCredentials,
        domain: &RegisteredDomain,
        records: &[HostRecord],
    ) -> Result<()>;
}

// ── Network Reachability Ports ────────────────────────────────────────────────

/// Local host firewall.
#[allow(async_fn_in_trait)]
pub trait Firewall {
    /// Whether an inbound allow rule for `port` exists.
    async fn has_rule(&self, port: u16) -> Result<bool>;

    /// Add an inbound TCP allow rule for `port`.
    async fn allow_port(&self, port: u16, description: &str) -> Result<()>;
}

/// Router port forwarding (UPnP IGD).
#[allow(async_fn_in_trait)]
pub trait PortMapper {
    async fn add_mapping(&self, mapping: &PortMapping) -> Result<(), MappingError>;
}

// ── Runtime Host Port ─────────────────────────────────────────────────────────

/// Platform-specific control of the container runtime installation.
#[allow(async_fn_in_trait)]
pub trait RuntimeHost {
    /// Ask the OS to start the runtime daemon. Returns once the request was
    /// made, not when the daemon is up.
    async fn start_daemon(&self) -> Result<()>;

    /// Run a downloaded installer with elevated privileges and wait for it.
    async fn run_installer(&self, installer: &Path) -> Result<()>;
}

// ── Config Store Port ─────────────────────────────────────────────────────────

/// Loads the gatewayctl configuration file.
pub trait ConfigStore {
    /// Missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<GatewayConfig>;

    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Filesystem Ports ──────────────────────────────────────────────────────────

/// Abstracts raw filesystem access.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    /// Atomically replace `to` with `from` (same filesystem).
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
}

/// Abstracts file hashing operations.
pub trait FileHasher {
    /// Compute the SHA-256 hash of a file.
    fn sha256_file(&self, path: &Path) -> Result<String>;
}

/// Idempotently materializes generated files.
///
/// Implemented for every `LocalFs` in `services::artifacts`.
pub trait ArtifactWriter {
    /// Create `path` and its parents if missing.
    fn ensure_dir(&self, path: &Path) -> Result<()>;

    /// Write `artifact` unless the file already holds identical content.
    fn write_artifact(&self, artifact: &Artifact) -> Result<WriteOutcome>;
}

// ── Capability Set ────────────────────────────────────────────────────────────

/// The full set of ports the orchestrator drives, bundled so front-ends
/// and tests can swap them as one value.
pub trait Capabilities {
    type Runner: CommandRunner;
    type Host: RuntimeHost;
    type Fs: LocalFs + FileHasher;
    type Http: Downloader + PublicAddress;
    type Dns: DnsResolver;
    type Registrar: RegistrarApi;
    type Firewall: Firewall;
    type Router: PortMapper;
    type Confirm: Confirmer;
    type Sink: EventSink;

    fn runner(&self) -> &Self::Runner;
    fn host(&self) -> &Self::Host;
    fn fs(&self) -> &Self::Fs;
    fn http(&self) -> &Self::Http;
    fn dns(&self) -> &Self::Dns;
    fn registrar(&self) -> &Self::Registrar;
    fn firewall(&self) -> &Self::Firewall;
    fn router(&self) -> &Self::Router;
    fn confirmer(&self) -> &Self::Confirm;
    fn sink(&self) -> &Self::Sink;
}
