//! Per-platform control of the Docker installation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::ports::{CommandRunner, RuntimeHost};
use crate::domain::error::GatewayError;

/// Installers wait on a UAC or sudo prompt.
const INSTALLER_TIMEOUT: Duration = Duration::from_secs(30 * 60);
#[cfg(not(windows))]
const START_TIMEOUT: Duration = Duration::from_secs(60);

#[cfg(windows)]
const DOCKER_DESKTOP_EXE: &str = r"C:\Program Files\Docker\Docker\Docker Desktop.exe";

pub struct DockerHost<R> {
    runner: R,
}

impl<R: CommandRunner> DockerHost<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn checked(&self, program: &str, args: &[&str], timeout: Duration) -> Result<()> {
        let out = self.runner.run_with_timeout(program, args, timeout).await?;
        if out.status.success() {
            Ok(())
        } else {
            Err(GatewayError::tool_failed(program, &out).into())
        }
    }
}

impl<R: CommandRunner> RuntimeHost for DockerHost<R> {
    async fn start_daemon(&self) -> Result<()> {
        info!("asking the OS to start the Docker daemon");
        start_daemon_impl(self).await
    }

    async fn run_installer(&self, installer: &Path) -> Result<()> {
        let (program, args) = installer_command(installer)?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        info!(installer = %installer.display(), "running installer");
        self.checked(program, &args, INSTALLER_TIMEOUT).await
    }
}

/// Docker Desktop keeps running after `--start`, so it is detached rather
/// than awaited.
#[cfg(windows)]
async fn start_daemon_impl<R: CommandRunner>(_host: &DockerHost<R>) -> Result<()> {
    tokio::process::Command::new(DOCKER_DESKTOP_EXE)
        .arg("--start")
        .spawn()
        .with_context(|| format!("failed to launch {DOCKER_DESKTOP_EXE}"))
        .map(drop)
}

#[cfg(target_os = "macos")]
async fn start_daemon_impl<R: CommandRunner>(host: &DockerHost<R>) -> Result<()> {
    host.checked("open", &["-a", "Docker"], START_TIMEOUT).await
}

#[cfg(not(any(windows, target_os = "macos")))]
async fn start_daemon_impl<R: CommandRunner>(host: &DockerHost<R>) -> Result<()> {
    host.checked("systemctl", &["start", "docker"], START_TIMEOUT)
        .await
        .context("starting docker.service")
}

/// Elevated installer invocation for this platform.
fn installer_command(installer: &Path) -> Result<(&'static str, Vec<String>)> {
    let path = installer
        .to_str()
        .context("installer path is not valid UTF-8")?
        .to_string();
    if cfg!(windows) {
        Ok((
            "powershell",
            vec![
                "-NoProfile".to_string(),
                "-Command".to_string(),
                format!(
                    "Start-Process -FilePath '{}' -ArgumentList 'install','--quiet' -Verb RunAs -Wait",
                    path.replace('\'', "''")
                ),
            ],
        ))
    } else if cfg!(target_os = "macos") {
        anyhow::bail!("install Docker Desktop for Mac from https://www.docker.com/products/docker-desktop/")
    } else {
        Ok(("sudo", vec!["sh".to_string(), path]))
    }
}
