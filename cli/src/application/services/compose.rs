//! Compose manifest synchronisation and container group control.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::application::ports::{CommandRunner, Downloader, FileHasher, LocalFs};
use crate::domain::config::GatewayPaths;
use crate::domain::containers::ContainerSnapshot;
use crate::domain::error::{GatewayError, ManifestError};
use crate::domain::manifest::{self, SyncOutcome};

/// `up -d` may pull images on first start.
pub const COMPOSE_UP_TIMEOUT: Duration = Duration::from_secs(900);
pub const COMPOSE_DOWN_TIMEOUT: Duration = Duration::from_secs(120);
pub const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch the published manifest and compare it with the local copy.
///
/// The download lands in the pending path. With no local manifest it is
/// promoted straight away; identical bytes discard it; different bytes keep
/// it for the operator to confirm. The local manifest is never modified by
/// a differing download.
///
/// # Errors
///
/// `ManifestError::DownloadFailed` on a non-200 status or transport error,
/// leaving the local manifest untouched.
pub async fn sync_manifest<F>(
    downloader: &impl Downloader,
    fs: &F,
    paths: &GatewayPaths,
    url: &str,
) -> Result<SyncOutcome>
where
    F: LocalFs + FileHasher,
{
    let manifest = paths.manifest();
    let pending = paths.pending_manifest();

    let status = match downloader.download(url, &pending).await {
        Ok(code) => code,
        Err(e) => {
            if fs.exists(&pending) {
                let _ = fs.remove_file(&pending);
            }
            return Err(ManifestError::DownloadFailed(format!("{e:#}")).into());
        }
    };
    if status != 200 {
        return Err(ManifestError::DownloadFailed(format!("HTTP {status} from {url}")).into());
    }

    if !fs.exists(&manifest) {
        fs.rename(&pending, &manifest)
            .context("installing compose manifest")?;
        info!(path = %manifest.display(), "manifest installed");
        return Ok(SyncOutcome::Installed);
    }

    let local = fs.sha256_file(&manifest).context("hashing local manifest")?;
    let remote = fs.sha256_file(&pending).context("hashing downloaded manifest")?;
    if local == remote {
        fs.remove_file(&pending)
            .context("discarding downloaded manifest")?;
        debug!(digest = %local, "manifest unchanged");
        return Ok(SyncOutcome::Unchanged);
    }

    info!(local = %local, remote = %remote, "manifest drift detected");
    Ok(SyncOutcome::NeedsConfirmation { pending })
}

/// Promote a confirmed pending manifest over the local one.
///
/// # Errors
///
/// Returns an error if there is nothing pending or the rename fails.
pub fn apply_pending(fs: &impl LocalFs, paths: &GatewayPaths) -> Result<()> {
    let pending = paths.pending_manifest();
    anyhow::ensure!(
        fs.exists(&pending),
        "no pending manifest at {}",
        pending.display()
    );
    fs.rename(&pending, &paths.manifest())
        .context("applying pending manifest")?;
    info!("pending manifest applied");
    Ok(())
}

/// Drop a rejected pending manifest. Returns whether one existed.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn discard_pending(fs: &impl LocalFs, paths: &GatewayPaths) -> Result<bool> {
    let pending = paths.pending_manifest();
    if !fs.exists(&pending) {
        return Ok(false);
    }
    fs.remove_file(&pending)
        .context("discarding pending manifest")?;
    Ok(true)
}

/// Digest of the local manifest, if present.
#[must_use]
pub fn manifest_digest<F: LocalFs + FileHasher>(fs: &F, paths: &GatewayPaths) -> Option<String> {
    let path = paths.manifest();
    if !fs.exists(&path) {
        return None;
    }
    fs.sha256_file(&path).ok()
}

/// Name of the network the manifest declares.
///
/// # Errors
///
/// `ManifestError::NoNetwork` if the manifest is missing, unreadable or has
/// no `networks:` entry.
pub fn network_name(fs: &impl LocalFs, paths: &GatewayPaths) -> Result<String, ManifestError> {
    let path = paths.manifest();
    fs.read_to_string(&path)
        .ok()
        .and_then(|text| manifest::network_name(&text))
        .ok_or(ManifestError::NoNetwork(path))
}

async fn compose(
    runner: &impl CommandRunner,
    paths: &GatewayPaths,
    action: &[&str],
    timeout: Duration,
) -> Result<()> {
    let manifest = paths.manifest();
    let env_file = paths.env_file();
    let manifest = manifest.to_string_lossy();
    let env_file = env_file.to_string_lossy();
    let mut args = vec!["compose", "-f", &*manifest, "--env-file", &*env_file];
    args.extend_from_slice(action);

    let output = runner
        .run_with_timeout("docker", &args, timeout)
        .await
        .with_context(|| format!("docker compose {}", action.join(" ")))?;
    if !output.status.success() {
        let tool = format!("docker compose {}", action.join(" "));
        let err = GatewayError::tool_failed(&tool, &output);
        warn!(error = %err, "compose command failed");
        return Err(err.into());
    }
    Ok(())
}

/// `docker compose -f <manifest> --env-file <env> up -d`.
///
/// # Errors
///
/// Returns `ExternalToolFailure` carrying stderr on non-zero exit.
pub async fn start(runner: &impl CommandRunner, paths: &GatewayPaths) -> Result<()> {
    compose(runner, paths, &["up", "-d"], COMPOSE_UP_TIMEOUT).await
}

/// `docker compose -f <manifest> --env-file <env> down`.
///
/// # Errors
///
/// Returns `ExternalToolFailure` carrying stderr on non-zero exit.
pub async fn stop(runner: &impl CommandRunner, paths: &GatewayPaths) -> Result<()> {
    compose(runner, paths, &["down"], COMPOSE_DOWN_TIMEOUT).await
}

/// Every container attached to `network`, stopped ones included.
///
/// # Errors
///
/// Returns an error if the listing cannot be run or exits non-zero.
pub async fn list_containers(
    runner: &impl CommandRunner,
    network: &str,
) -> Result<ContainerSnapshot> {
    let filter = format!("network={network}");
    let output = runner
        .run_with_timeout(
            "docker",
            &[
                "ps",
                "-a",
                "--filter",
                &filter,
                "--format",
                "{{.Names}}: {{.Status}}",
            ],
            LIST_TIMEOUT,
        )
        .await
        .context("listing containers")?;
    if !output.status.success() {
        return Err(GatewayError::tool_failed("docker ps", &output).into());
    }
    Ok(ContainerSnapshot::parse(&String::from_utf8_lossy(
        &output.stdout,
    )))
}
