//! Container runtime supervision: probe, start the daemon, install.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::ports::{CommandRunner, Downloader, EventSink, LocalFs, RuntimeHost};
use crate::domain::error::RuntimeError;
use crate::domain::runtime::{self as rt, RuntimeState};

/// Bound on `docker --version` and `docker info`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Wait after asking the OS to start the daemon before re-probing.
pub const DAEMON_SETTLE: Duration = Duration::from_secs(5);

// ── Installation status ──────────────────────────────────────────────────────

/// Process-wide "installation in progress" flag.
///
/// Clones share the flag and can only read it. It is set exclusively by
/// [`install`] for the duration of an installation.
#[derive(Debug, Clone, Default)]
pub struct InstallStatus(Arc<AtomicBool>);

impl InstallStatus {
    #[must_use]
    pub fn is_installing(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// A status that reports an installation in progress.
    #[cfg(test)]
    pub(crate) fn installing() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    fn begin(&self) -> InstallGuard<'_> {
        self.0.store(true, Ordering::Release);
        InstallGuard(self)
    }
}

/// Clears the flag when the installation ends, however it ends.
struct InstallGuard<'a>(&'a InstallStatus);

impl Drop for InstallGuard<'_> {
    fn drop(&mut self) {
        self.0.0.store(false, Ordering::Release);
    }
}

// ── Probing ──────────────────────────────────────────────────────────────────

/// Whether the runtime CLI answers `--version`. Timeout or absence both
/// count as not installed. Warns once per call on an unsupported version.
async fn probe_installed(runner: &impl CommandRunner, sink: &impl EventSink) -> bool {
    match runner
        .run_with_timeout("docker", &["--version"], PROBE_TIMEOUT)
        .await
    {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            match rt::parse_version(&text) {
                Some(v) if !rt::is_supported(&v) => sink.warn(&format!(
                    "Docker {v} is older than {}; 'docker compose' may be unavailable.",
                    rt::MIN_RUNTIME_VERSION
                )),
                Some(v) => debug!(version = %v, "runtime version"),
                None => debug!(output = %text.trim(), "unrecognised runtime version output"),
            }
            true
        }
        Ok(out) => {
            debug!(code = ?out.status.code(), "docker --version failed");
            false
        }
        Err(e) => {
            debug!(error = %e, "docker --version unavailable");
            false
        }
    }
}

/// Whether the daemon answers `docker info`.
async fn probe_daemon(runner: &impl CommandRunner) -> Result<(), String> {
    match runner
        .run_with_timeout("docker", &["info"], PROBE_TIMEOUT)
        .await
    {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => Err(String::from_utf8_lossy(&out.stderr).trim().to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Probe without side effects.
pub async fn probe(runner: &impl CommandRunner, sink: &impl EventSink) -> RuntimeState {
    if !probe_installed(runner, sink).await {
        return RuntimeState::default();
    }
    RuntimeState {
        installed: true,
        daemon_running: probe_daemon(runner).await.is_ok(),
    }
}

/// Make sure the runtime is installed and its daemon is running.
///
/// An inactive daemon is started once, given [`DAEMON_SETTLE`] to come up
/// and re-probed once.
///
/// # Errors
///
/// `NotInstalled` when the CLI is missing, `DaemonStartFailed` when the
/// daemon is still down after the single restart attempt.
pub async fn ensure_ready(
    runner: &impl CommandRunner,
    host: &impl RuntimeHost,
    sink: &impl EventSink,
) -> Result<RuntimeState, RuntimeError> {
    if !probe_installed(runner, sink).await {
        return Err(RuntimeError::NotInstalled);
    }
    if probe_daemon(runner).await.is_ok() {
        return Ok(RuntimeState::ready());
    }

    info!("runtime daemon inactive, starting it");
    sink.info("Docker daemon is not running. Starting it...");
    if let Err(e) = host.start_daemon().await {
        warn!(error = %e, "daemon start request failed");
    }
    tokio::time::sleep(DAEMON_SETTLE).await;

    match probe_daemon(runner).await {
        Ok(()) => Ok(RuntimeState::ready()),
        Err(reason) => Err(RuntimeError::DaemonStartFailed(if reason.is_empty() {
            "daemon did not respond after start".to_string()
        } else {
            reason
        })),
    }
}

// ── Installation ─────────────────────────────────────────────────────────────

/// Download the installer into `temp_dir` and run it elevated.
///
/// Sets `status` for the duration. The downloaded installer is deleted on
/// every exit path. There is no retry.
///
/// # Errors
///
/// `InstallFailed` on a non-200 download, transport failure or installer
/// failure.
pub async fn install(
    downloader: &impl Downloader,
    host: &impl RuntimeHost,
    fs: &impl LocalFs,
    status: &InstallStatus,
    installer_url: &str,
    temp_dir: &Path,
    sink: &impl EventSink,
) -> Result<(), RuntimeError> {
    let _guard = status.begin();
    let installer = temp_dir.join(rt::installer_file_name());
    sink.info("Downloading Docker installer...");

    let result = async {
        let code = downloader
            .download(installer_url, &installer)
            .await
            .map_err(|e| RuntimeError::InstallFailed(format!("download failed: {e:#}")))?;
        if code != 200 {
            return Err(RuntimeError::InstallFailed(format!(
                "installer download returned HTTP {code}"
            )));
        }
        sink.info("Running Docker installer. Approve the elevation prompt to continue.");
        host.run_installer(&installer)
            .await
            .map_err(|e| RuntimeError::InstallFailed(format!("{e:#}")))
    }
    .await;

    if fs.exists(&installer) {
        if let Err(e) = fs.remove_file(&installer) {
            warn!(path = %installer.display(), error = %e, "could not delete installer");
        }
    }
    result
}
