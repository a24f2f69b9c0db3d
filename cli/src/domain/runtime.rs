//! Container runtime state and version parsing.
//!
//! Pure functions only.

use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

/// Oldest runtime that ships the `compose` plugin subcommand.
pub const MIN_RUNTIME_VERSION: Version = Version::new(20, 10, 0);

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid regex")
});

/// Runtime state derived by probing. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeState {
    pub installed: bool,
    pub daemon_running: bool,
}

impl RuntimeState {
    #[must_use]
    pub fn ready() -> Self {
        Self {
            installed: true,
            daemon_running: true,
        }
    }

    /// Operator-facing one-line summary.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match (self.installed, self.daemon_running) {
            (true, true) => "Docker is installed and running.",
            (true, false) => "Docker is installed but the daemon is not running.",
            (false, _) => "Docker is not installed.",
        }
    }
}

/// Extract the version from `docker --version` output, e.g.
/// `Docker version 24.0.7, build afdd53b`.
#[must_use]
pub fn parse_version(output: &str) -> Option<Version> {
    let caps = VERSION_RE.captures(output)?;
    let part = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

#[must_use]
pub fn is_supported(version: &Version) -> bool {
    *version >= MIN_RUNTIME_VERSION
}

/// File name the installer is downloaded to inside the temp directory.
#[must_use]
pub fn installer_file_name() -> &'static str {
    if cfg!(windows) {
        "docker-desktop-installer.exe"
    } else {
        "get-docker.sh"
    }
}
