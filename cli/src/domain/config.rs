//! Domain types for gatewayctl configuration and the on-disk node layout.
//!
//! Pure functions only. No I/O, no async, no filesystem access.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/ar-io/ar-io-node/main/docker-compose.yaml";

#[cfg(windows)]
pub const DEFAULT_INSTALLER_URL: &str =
    "https://desktop.docker.com/win/main/amd64/Docker%20Desktop%20Installer.exe";
#[cfg(not(windows))]
pub const DEFAULT_INSTALLER_URL: &str = "https://get.docker.com";

pub const DEFAULT_NODE_DIR_NAME: &str = "ar-io-node";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.gateway/config.yaml`.
///
/// Every field has a default, so an absent or empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Node directory. `None` means `~/ar-io-node`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_dir: Option<PathBuf>,
    /// Where the compose manifest is published.
    pub manifest_url: String,
    /// Container runtime installer for this platform.
    pub installer_url: String,
    /// Host port the gateway core listens on, proxied by nginx.
    pub upstream_port: u16,
    /// Number of containers in a fully running service group.
    pub expected_services: usize,
    /// Seconds between reconciliation polls.
    pub poll_interval_secs: u64,
    /// Inbound ports opened on the firewall and forwarded on the router.
    pub gateway_ports: Vec<u16>,
    /// Name of the reverse-proxy container.
    pub proxy_container: String,
    /// Description attached to router port mappings and firewall rules.
    pub mapping_description: String,
    /// Subdomain resolved to verify the wildcard record.
    pub probe_subdomain: String,
    /// Issue certificates from the ACME staging environment.
    pub acme_staging: bool,
    /// Linux build of gatewayctl mounted into the proxy container for the
    /// DNS-01 hooks. `None` means the running executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_binary: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            node_dir: None,
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            installer_url: DEFAULT_INSTALLER_URL.to_string(),
            upstream_port: 3000,
            expected_services: 4,
            poll_interval_secs: 10,
            gateway_ports: vec![80, 443],
            proxy_container: "nginx-proxy".to_string(),
            mapping_description: "ar-io-gateway".to_string(),
            probe_subdomain: "potato".to_string(),
            acme_staging: false,
            hook_binary: None,
        }
    }
}

impl GatewayConfig {
    /// Resolve the node directory against the user's home.
    #[must_use]
    pub fn node_dir_in(&self, home: &Path) -> PathBuf {
        self.node_dir
            .clone()
            .unwrap_or_else(|| home.join(DEFAULT_NODE_DIR_NAME))
    }
}

// ── Node layout ──────────────────────────────────────────────────────────────

/// Every file gatewayctl reads or writes under the node directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPaths {
    root: PathBuf,
}

impl GatewayPaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    #[must_use]
    pub fn manifest(&self) -> PathBuf {
        self.root.join("docker-compose.yaml")
    }

    /// Download target for the remote manifest, kept beside the manifest so
    /// promotion is a same-filesystem rename.
    #[must_use]
    pub fn pending_manifest(&self) -> PathBuf {
        self.root.join("docker-compose.yaml.pending")
    }

    #[must_use]
    pub fn domain_file(&self) -> PathBuf {
        self.root.join(".domain")
    }

    #[must_use]
    pub fn wallets_dir(&self) -> PathBuf {
        self.root.join("wallets")
    }

    #[must_use]
    pub fn proxy_dir(&self) -> PathBuf {
        self.root.join("nginx")
    }

    #[must_use]
    pub fn proxy_config(&self) -> PathBuf {
        self.proxy_dir().join("nginx.conf")
    }

    #[must_use]
    pub fn proxy_tls_config(&self) -> PathBuf {
        self.proxy_dir().join("nginx-ssl.conf")
    }

    #[must_use]
    pub fn proxy_dockerfile(&self) -> PathBuf {
        self.proxy_dir().join("Dockerfile")
    }

    #[must_use]
    pub fn proxy_compose(&self) -> PathBuf {
        self.proxy_dir().join("docker-compose.yaml")
    }

    #[must_use]
    pub fn hooks_dir(&self) -> PathBuf {
        self.proxy_dir().join("hooks")
    }

    #[must_use]
    pub fn auth_hook(&self) -> PathBuf {
        self.hooks_dir().join("auth.sh")
    }

    #[must_use]
    pub fn cleanup_hook(&self) -> PathBuf {
        self.hooks_dir().join("cleanup.sh")
    }

    /// Host directory mounted at `/etc/letsencrypt` in the proxy container.
    #[must_use]
    pub fn certs_dir(&self) -> PathBuf {
        self.root.join("certs")
    }
}
