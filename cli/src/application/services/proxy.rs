//! Reverse-proxy deployment state machine.
//!
//! Each run starts at `Idle` and walks the stages strictly in order. A
//! failed step parks the deployer in `Failed` and stops the run; the next
//! invocation starts again from `Idle`. Directory and file steps are
//! idempotent, certificate issuance is not (see `--force-renewal`).

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::ports::{ArtifactWriter, CommandRunner, EventSink};
use crate::domain::challenge::{
    ENV_CLIENT_IP, ENV_REGISTRAR_KEY, ENV_REGISTRAR_USER, RegistrarCredentials,
};
use crate::domain::config::GatewayPaths;
use crate::domain::error::{GatewayError, ProxyError, classify};
use crate::domain::proxy::{
    self as px, CONTAINER_NGINX_CONF, CertTarget, CertificateWorkflowState, ProxyParams,
    ProxyStage,
};

pub const BUILD_TIMEOUT: Duration = Duration::from_secs(900);
/// One issuance covers the hook's settle and full polling schedule.
pub const ISSUE_TIMEOUT: Duration = Duration::from_secs(1200);
pub const RELOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives one proxy deployment.
pub struct ProxyDeployer<'a, R, W, S> {
    runner: &'a R,
    writer: &'a W,
    sink: &'a S,
    paths: &'a GatewayPaths,
    params: ProxyParams,
    credentials: RegistrarCredentials,
    staging: bool,
    stage: ProxyStage,
    certificates: CertificateWorkflowState,
}

impl<'a, R, W, S> ProxyDeployer<'a, R, W, S>
where
    R: CommandRunner,
    W: ArtifactWriter,
    S: EventSink,
{
    pub fn new(
        runner: &'a R,
        writer: &'a W,
        sink: &'a S,
        paths: &'a GatewayPaths,
        params: ProxyParams,
        credentials: RegistrarCredentials,
    ) -> Self {
        Self {
            runner,
            writer,
            sink,
            paths,
            params,
            credentials,
            staging: false,
            stage: ProxyStage::Idle,
            certificates: CertificateWorkflowState::default(),
        }
    }

    /// Issue from the ACME staging environment.
    #[must_use]
    pub fn staging(mut self, staging: bool) -> Self {
        self.staging = staging;
        self
    }

    #[must_use]
    pub fn stage(&self) -> &ProxyStage {
        &self.stage
    }

    #[must_use]
    pub fn certificates(&self) -> CertificateWorkflowState {
        self.certificates
    }

    /// Run every remaining stage.
    ///
    /// # Errors
    ///
    /// `ProxyError::StageFailed` naming the stage that could not be entered.
    pub async fn deploy(&mut self) -> Result<(), ProxyError> {
        self.stage = ProxyStage::Idle;
        self.certificates = CertificateWorkflowState::default();
        while let Some(next) = self.stage.next() {
            if let Err(e) = self.enter(&next).await {
                let reason = format!("{e:#}");
                let kind = classify(&e);
                warn!(stage = next.name(), kind = kind.as_str(), %reason, "proxy stage failed");
                self.stage = ProxyStage::Failed {
                    stage: next.name(),
                    reason: reason.clone(),
                };
                return Err(ProxyError::StageFailed {
                    stage: next.name(),
                    reason,
                    kind,
                });
            }
            info!(stage = next.name(), "proxy stage complete");
            self.sink.info(&format!("Proxy: {next}"));
            self.stage = next;
        }
        Ok(())
    }

    async fn enter(&mut self, stage: &ProxyStage) -> Result<()> {
        match stage {
            ProxyStage::DirectoriesReady => {
                for dir in px::required_dirs(self.paths) {
                    self.writer
                        .ensure_dir(&dir)
                        .with_context(|| format!("creating {}", dir.display()))?;
                }
                Ok(())
            }
            ProxyStage::ConfigWritten => {
                for artifact in px::base_artifacts(self.paths, &self.params) {
                    self.writer
                        .write_artifact(&artifact)
                        .with_context(|| format!("writing {}", artifact.path.display()))?;
                }
                Ok(())
            }
            ProxyStage::ContainerUp => self.build_and_start().await,
            ProxyStage::ChallengeBase => self.issue(CertTarget::Base).await,
            ProxyStage::ChallengeWildcard => self.issue(CertTarget::Wildcard).await,
            ProxyStage::SslApplied => self.apply_tls().await,
            ProxyStage::Idle | ProxyStage::Done | ProxyStage::Failed { .. } => Ok(()),
        }
    }

    async fn docker(&self, tool: &str, args: &[&str], timeout: Duration) -> Result<()> {
        let output = self
            .runner
            .run_with_timeout("docker", args, timeout)
            .await
            .with_context(|| tool.to_string())?;
        if !output.status.success() {
            return Err(GatewayError::tool_failed(tool, &output).into());
        }
        Ok(())
    }

    async fn build_and_start(&self) -> Result<()> {
        let compose = self.paths.proxy_compose();
        let compose = compose.to_string_lossy();
        self.sink.info("Building and starting the proxy container...");
        self.docker(
            "docker compose up (proxy)",
            &["compose", "-f", &compose, "up", "-d", "--build"],
            BUILD_TIMEOUT,
        )
        .await
    }

    async fn issue(&mut self, target: CertTarget) -> Result<()> {
        let domain = target.domain_arg(&self.params.fqdn);
        self.sink.info(&format!(
            "Requesting a certificate for {domain}. DNS propagation can take up to ten minutes."
        ));
        let args =
            px::certbot_exec_args(&self.params.container, &self.params.fqdn, target, self.staging);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let client_ip = self.credentials.client_ip.to_string();
        let env = [
            (ENV_REGISTRAR_USER, self.credentials.api_user.as_str()),
            (ENV_REGISTRAR_KEY, self.credentials.api_key.as_str()),
            (ENV_CLIENT_IP, client_ip.as_str()),
        ];
        let output = self
            .runner
            .run_with_env("docker", &args, &env, ISSUE_TIMEOUT)
            .await
            .with_context(|| format!("certbot for {domain}"))?;
        if !output.status.success() {
            return Err(GatewayError::tool_failed(&format!("certbot ({domain})"), &output).into());
        }
        self.certificates.record(target);
        Ok(())
    }

    async fn apply_tls(&self) -> Result<()> {
        let artifact = px::tls_artifact(self.paths, &self.params);
        self.writer
            .write_artifact(&artifact)
            .with_context(|| format!("writing {}", artifact.path.display()))?;
        let source = artifact.path.to_string_lossy();
        let dest = format!("{}:{CONTAINER_NGINX_CONF}", self.params.container);
        let container = self.params.container.as_str();
        self.docker("docker cp", &["cp", &source, &dest], RELOAD_TIMEOUT)
            .await?;
        self.docker("nginx -t", &["exec", container, "nginx", "-t"], RELOAD_TIMEOUT)
            .await?;
        self.docker(
            "nginx -s reload",
            &["exec", container, "nginx", "-s", "reload"],
            RELOAD_TIMEOUT,
        )
        .await
    }
}
