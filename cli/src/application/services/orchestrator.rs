//! Top-level lifecycle sequencing for the gateway node.
//!
//! Every public operation catches its own errors, reports them through the
//! event sink with their `ErrorKind` and returns a plain success flag or
//! value. Nothing here panics or propagates an error to the caller.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gateway_common::{DomainConfig, EnvVar, UiEvent};
use tracing::{debug, info};

use crate::application::ports::{Capabilities, Confirmer, EventSink, LocalFs, PublicAddress};
use crate::application::services::dns::{DnsContext, DnsReport};
use crate::application::services::proxy::ProxyDeployer;
use crate::application::services::reconcile::{ReconcileMemo, Reconciler, TickOutcome};
use crate::application::services::runtime::InstallStatus;
use crate::application::services::{compose, dns, env, network, runtime, wallet};
use crate::domain::challenge::RegistrarCredentials;
use crate::domain::config::{GatewayConfig, GatewayPaths};
use crate::domain::containers::ContainerSnapshot;
use crate::domain::error::{ProxyError, RuntimeError, classify};
use crate::domain::manifest::SyncOutcome;
use crate::domain::proxy::ProxyParams;
use crate::domain::runtime::RuntimeState;
use crate::domain::wallet::Wallet;

/// Point-in-time view for `gatewayctl status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayStatus {
    pub runtime: RuntimeState,
    pub manifest_digest: Option<String>,
    pub pending_manifest: bool,
    /// Credentials masked.
    pub domain: Option<DomainConfig>,
    pub network: Option<String>,
    pub containers: Option<ContainerSnapshot>,
    /// Binary mounted into the proxy container for the DNS-01 hooks.
    pub hook_binary: Option<PathBuf>,
}

pub struct Orchestrator<C> {
    caps: C,
    config: GatewayConfig,
    paths: GatewayPaths,
    hook_binary: Option<PathBuf>,
    temp_dir: PathBuf,
    install: InstallStatus,
    memo: ReconcileMemo,
}

impl<C: Capabilities> Orchestrator<C> {
    /// `hook_binary` is `None` when no binary able to run inside the proxy
    /// container is known; `deploy_proxy` then refuses to start.
    pub fn new(
        caps: C,
        config: GatewayConfig,
        paths: GatewayPaths,
        hook_binary: Option<PathBuf>,
    ) -> Self {
        Self {
            caps,
            config,
            paths,
            hook_binary,
            temp_dir: std::env::temp_dir(),
            install: InstallStatus::default(),
            memo: ReconcileMemo::default(),
        }
    }

    /// Directory the runtime installer is downloaded into.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = dir;
        self
    }

    #[must_use]
    pub fn capabilities(&self) -> &C {
        &self.caps
    }

    #[must_use]
    pub fn paths(&self) -> &GatewayPaths {
        &self.paths
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Read-only handle on the installation flag.
    #[must_use]
    pub fn install_status(&self) -> InstallStatus {
        self.install.clone()
    }

    fn sink(&self) -> &C::Sink {
        self.caps.sink()
    }

    fn fail(&self, context: &str, err: impl Into<anyhow::Error>) {
        let err = err.into();
        let kind = classify(&err);
        debug!(kind = kind.as_str(), error = %format!("{err:#}"), "{context}");
        self.sink().failure(&format!("{context}: {err:#}"), kind);
    }

    fn fail_runtime(&self, err: &RuntimeError) {
        debug!(kind = err.kind().as_str(), error = %err, "runtime unavailable");
        self.sink().failure(&err.to_string(), err.kind());
    }

    // ── Startup ──────────────────────────────────────────────────────────────

    /// Bootstrap the node directory, publish the saved domain and bring the
    /// runtime and compose environment up to date. Returns whether the
    /// runtime is ready.
    pub async fn startup(&self) -> bool {
        match env::ensure_env_file(self.caps.fs(), &self.paths) {
            Ok(true) => self.sink().info("Created a default environment file."),
            Ok(false) => {}
            Err(e) => {
                self.fail("Could not prepare the node directory", e);
                return false;
            }
        }
        let domain = self.load_domain();
        self.sink().emit(UiEvent::DomainLoaded { domain });

        if self.runtime_status().await.is_none() {
            return false;
        }
        self.prepare_environment().await;
        true
    }

    /// Probe the runtime (starting the daemon once if needed) and emit a
    /// `runtime-status` event. Returns the state when ready.
    pub async fn runtime_status(&self) -> Option<RuntimeState> {
        let result =
            runtime::ensure_ready(self.caps.runner(), self.caps.host(), self.sink()).await;
        let state = match &result {
            Ok(state) => *state,
            Err(RuntimeError::NotInstalled) => RuntimeState::default(),
            Err(_) => RuntimeState {
                installed: true,
                daemon_running: false,
            },
        };
        self.sink().emit(UiEvent::RuntimeStatus {
            message: state.describe().to_string(),
            installed: state.installed,
            daemon_running: state.daemon_running,
        });
        match result {
            Ok(state) => Some(state),
            Err(e) => {
                self.fail_runtime(&e);
                None
            }
        }
    }

    /// Download and run the runtime installer, then re-check readiness and
    /// prepare the compose environment.
    pub async fn install_runtime(&self) -> bool {
        let installed = runtime::install(
            self.caps.http(),
            self.caps.host(),
            self.caps.fs(),
            &self.install,
            &self.config.installer_url,
            &self.temp_dir,
            self.sink(),
        )
        .await;
        if let Err(e) = installed {
            self.fail_runtime(&e);
            return false;
        }
        if self.runtime_status().await.is_none() {
            return false;
        }
        self.sink().emit(UiEvent::InstallComplete);
        self.prepare_environment().await
    }

    /// Sync the manifest and take an immediate container listing.
    pub async fn prepare_environment(&self) -> bool {
        let synced = compose::sync_manifest(
            self.caps.http(),
            self.caps.fs(),
            &self.paths,
            &self.config.manifest_url,
        )
        .await;
        let ok = match synced {
            Ok(SyncOutcome::Installed) => {
                self.sink().info("Downloaded the compose manifest.");
                true
            }
            Ok(SyncOutcome::Unchanged) => {
                self.sink().info("The compose manifest is up to date.");
                true
            }
            Ok(SyncOutcome::NeedsConfirmation { pending }) => {
                self.resolve_drift(&pending).await;
                true
            }
            Err(e) => {
                self.fail("Manifest sync failed", e);
                false
            }
        };
        self.reconcile_once().await;
        ok
    }

    async fn resolve_drift(&self, pending: &Path) {
        let accepted = self
            .caps
            .confirmer()
            .confirm(
                "Compose manifest update",
                "A newer docker-compose.yaml has been published. Replace the local copy?",
            )
            .await
            .unwrap_or(false);
        if accepted {
            self.confirm_manifest(true, None);
        } else {
            info!(pending = %pending.display(), "manifest update left pending");
            self.sink()
                .info("Kept the local compose manifest. The update stays pending.");
            self.sink().emit(UiEvent::ManifestUpdateAvailable {
                pending: pending.display().to_string(),
            });
        }
    }

    /// Accept or reject the pending manifest. `pending`, when given, must
    /// name the file this node downloaded.
    pub fn confirm_manifest(&self, accepted: bool, pending: Option<&Path>) -> bool {
        let expected = self.paths.pending_manifest();
        if let Some(path) = pending.filter(|p| *p != expected) {
            self.sink().error(&format!(
                "Unknown pending manifest {}; expected {}.",
                path.display(),
                expected.display()
            ));
            return false;
        }
        if accepted {
            match compose::apply_pending(self.caps.fs(), &self.paths) {
                Ok(()) => {
                    self.sink().info("Applied the updated compose manifest.");
                    true
                }
                Err(e) => {
                    self.fail("Could not apply the manifest update", e);
                    false
                }
            }
        } else {
            match compose::discard_pending(self.caps.fs(), &self.paths) {
                Ok(_) => {
                    self.sink().info("Discarded the pending compose manifest.");
                    true
                }
                Err(e) => {
                    self.fail("Could not discard the manifest update", e);
                    false
                }
            }
        }
    }

    // ── Reconciliation ───────────────────────────────────────────────────────

    fn reconciler(&self) -> Reconciler<'_, C::Runner, C::Host, C::Fs, C::Sink> {
        Reconciler {
            runner: self.caps.runner(),
            host: self.caps.host(),
            fs: self.caps.fs(),
            sink: self.sink(),
            paths: &self.paths,
            install: &self.install,
            expected_services: self.config.expected_services,
            memo: &self.memo,
        }
    }

    pub async fn reconcile_once(&self) -> TickOutcome {
        self.reconciler().tick().await
    }

    /// Poll forever at the configured interval.
    pub async fn run_reconcile_loop(&self) {
        let interval = Duration::from_secs(self.config.poll_interval_secs.max(1));
        self.reconciler().run(interval).await;
    }

    /// Open the firewall and forward the gateway ports. Returns the ports
    /// that still need manual forwarding.
    pub async fn provision_network(&self) -> BTreeSet<u16> {
        network::provision(
            self.caps.firewall(),
            self.caps.router(),
            &self.config.gateway_ports,
            &self.config.mapping_description,
            self.sink(),
        )
        .await
    }

    // ── Container group ──────────────────────────────────────────────────────

    pub async fn start(&self) -> bool {
        if self.runtime_status().await.is_none() {
            return false;
        }
        self.sink().info("Starting the gateway...");
        if let Err(e) = compose::start(self.caps.runner(), &self.paths).await {
            self.fail("Failed to start the gateway", e);
            return false;
        }
        self.sink().info("Gateway started.");
        self.memo.reset();
        self.reconcile_once().await;
        true
    }

    pub async fn stop(&self) -> bool {
        self.sink().info("Stopping the gateway...");
        if let Err(e) = compose::stop(self.caps.runner(), &self.paths).await {
            self.fail("Failed to stop the gateway", e);
            return false;
        }
        self.sink().info("Gateway stopped.");
        self.memo.reset();
        self.reconcile_once().await;
        true
    }

    /// Merge `vars` into the env file and restart the group. A failed stop
    /// skips the start.
    pub async fn save_env(&self, vars: &[EnvVar]) -> bool {
        match env::merge_env(self.caps.fs(), &self.paths, vars) {
            Ok(true) => self.sink().info("Saved environment settings."),
            Ok(false) => self.sink().info("Environment settings unchanged."),
            Err(e) => {
                self.fail("Could not save environment settings", e);
                return false;
            }
        }
        if !self.stop().await {
            self.sink()
                .warn("Skipped restarting the gateway because it did not stop cleanly.");
            return false;
        }
        self.start().await
    }

    // ── Domain ───────────────────────────────────────────────────────────────

    /// The saved domain. An unreadable file is reported and treated as none.
    pub fn load_domain(&self) -> Option<DomainConfig> {
        match dns::load_domain(self.caps.fs(), &self.paths) {
            Ok(domain) => domain,
            Err(e) => {
                self.fail("Could not read the saved domain", e);
                None
            }
        }
    }

    /// Validate and persist `domain`, then check its DNS records.
    pub async fn save_domain(&self, domain: DomainConfig) -> Option<DomainConfig> {
        let saved = match dns::save_domain(self.caps.fs(), &self.paths, domain) {
            Ok(saved) => saved,
            Err(e) => {
                self.fail("Could not save the domain", e);
                return None;
            }
        };
        self.sink().info(&format!("Saved domain {}.", saved.fqdn));
        self.sink().emit(UiEvent::DomainLoaded {
            domain: Some(saved.clone()),
        });
        self.check_domain(&saved).await;
        Some(saved)
    }

    /// Compare the domain's A records with this machine's public address.
    pub async fn check_domain(&self, domain: &DomainConfig) -> Option<DnsReport> {
        let ctx = DnsContext {
            resolver: self.caps.dns(),
            public: self.caps.http(),
            registrar: self.caps.registrar(),
            confirmer: self.caps.confirmer(),
            sink: self.sink(),
        };
        match dns::check_and_reconcile(&ctx, domain, &self.config.probe_subdomain).await {
            Ok(report) => Some(report),
            Err(e) => {
                self.fail("DNS check failed", e);
                None
            }
        }
    }

    // ── Proxy ────────────────────────────────────────────────────────────────

    /// Deploy the TLS reverse proxy for the saved domain.
    pub async fn deploy_proxy(&self) -> bool {
        let Some(domain) = self.load_domain() else {
            self.fail("Cannot deploy the proxy", ProxyError::NoDomain);
            return false;
        };
        let Some((api_user, api_key)) = domain.credentials() else {
            self.fail(
                "Cannot deploy the proxy",
                ProxyError::NoCredentials(domain.fqdn.clone()),
            );
            return false;
        };
        let Some(hook_binary) = self.hook_binary.clone() else {
            self.fail("Cannot deploy the proxy", ProxyError::NoHookBinary);
            return false;
        };
        let client_ip = match self.caps.http().public_ipv4().await {
            Ok(ip) => ip,
            Err(e) => {
                self.fail("Could not determine the public address", e);
                return false;
            }
        };
        let credentials = RegistrarCredentials {
            api_user: api_user.to_string(),
            api_key: api_key.to_string(),
            client_ip,
        };
        let params = ProxyParams {
            fqdn: domain.fqdn.clone(),
            upstream_port: self.config.upstream_port,
            container: self.config.proxy_container.clone(),
            hook_binary,
        };
        let mut deployer = ProxyDeployer::new(
            self.caps.runner(),
            self.caps.fs(),
            self.sink(),
            &self.paths,
            params,
            credentials,
        )
        .staging(self.config.acme_staging);
        match deployer.deploy().await {
            Ok(()) => {
                self.sink().info(&format!(
                    "Proxy deployed with certificates for {0} and *.{0}.",
                    domain.fqdn
                ));
                true
            }
            Err(e) => {
                self.fail("Proxy deployment failed", e);
                false
            }
        }
    }

    // ── Wallet ───────────────────────────────────────────────────────────────

    pub fn load_wallet(&self, source: &Path) -> Option<Wallet> {
        match wallet::load_wallet(self.caps.fs(), &self.paths, source) {
            Ok(wallet) => {
                self.sink()
                    .info(&format!("Loaded observer wallet {}.", wallet.address));
                Some(wallet)
            }
            Err(e) => {
                self.fail("Could not load the wallet file", e);
                None
            }
        }
    }

    // ── Status ───────────────────────────────────────────────────────────────

    /// Side-effect free snapshot: the daemon is never started from here.
    pub async fn status(&self) -> GatewayStatus {
        let runtime_state = runtime::probe(self.caps.runner(), self.sink()).await;
        let network = compose::network_name(self.caps.fs(), &self.paths).ok();
        let containers = match (&network, runtime_state.daemon_running) {
            (Some(name), true) => compose::list_containers(self.caps.runner(), name).await.ok(),
            _ => None,
        };
        GatewayStatus {
            runtime: runtime_state,
            manifest_digest: compose::manifest_digest(self.caps.fs(), &self.paths),
            pending_manifest: self.caps.fs().exists(&self.paths.pending_manifest()),
            domain: dns::load_domain(self.caps.fs(), &self.paths)
                .ok()
                .flatten()
                .map(|d| d.redacted()),
            network,
            containers,
            hook_binary: self.hook_binary.clone(),
        }
    }
}
