//! Human-readable terminal renderer.

use gateway_common::DomainConfig;
use owo_colors::OwoColorize as _;

use crate::application::services::dns::{DnsReport, RecordOutcome};
use crate::application::services::orchestrator::GatewayStatus;
use crate::domain::containers::ContainerSnapshot;
use crate::domain::env_file::EnvironmentConfig;
use crate::output::OutputContext;

/// Renders gateway state as human-readable terminal output.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render `gatewayctl status`.
    pub fn render_status(&self, status: &GatewayStatus) {
        self.ctx.header("Runtime:");
        self.ctx.kv("Docker:", status.runtime.describe());
        println!();

        self.ctx.header("Compose:");
        self.ctx.kv(
            "Manifest:",
            status.manifest_digest.as_deref().unwrap_or("(not downloaded)"),
        );
        if status.pending_manifest {
            self.ctx
                .warn("An updated manifest is pending. Run: gatewayctl manifest apply");
        }
        self.ctx.kv(
            "Network:",
            status.network.as_deref().unwrap_or("(none declared)"),
        );
        match &status.containers {
            Some(snapshot) => self.render_containers(snapshot),
            None => self.ctx.kv("Containers:", "(unavailable)"),
        }
        println!();

        self.ctx.header("Domain:");
        self.render_domain(status.domain.as_ref());
        match &status.hook_binary {
            Some(path) => self.ctx.kv("Hook binary:", &path.display().to_string()),
            None => self
                .ctx
                .warn("No certificate hook binary. Set hook_binary to a Linux gatewayctl build."),
        }
    }

    fn render_containers(&self, snapshot: &ContainerSnapshot) {
        if snapshot.is_empty() {
            self.ctx.kv("Containers:", "none");
            return;
        }
        self.ctx.kv("Containers:", &snapshot.len().to_string());
        if self.ctx.quiet {
            return;
        }
        for c in &snapshot.containers {
            let style = if c.is_running() {
                self.ctx.styles.success
            } else {
                self.ctx.styles.dim
            };
            println!("    {:<24} {}", c.name, c.status.style(style));
        }
    }

    /// Render a saved domain. Callers pass it already redacted.
    pub fn render_domain(&self, domain: Option<&DomainConfig>) {
        let Some(domain) = domain else {
            self.ctx.kv("FQDN:", "(not configured)");
            self.ctx.info("Configure one: gatewayctl domain set <fqdn>");
            return;
        };
        self.ctx.kv("FQDN:", &domain.fqdn);
        if domain.use_registrar_api {
            self.ctx.kv("Registrar API:", "enabled");
            self.ctx
                .kv("API user:", domain.api_user.as_deref().unwrap_or("(missing)"));
            self.ctx
                .kv("API key:", domain.api_key.as_deref().unwrap_or("(missing)"));
        } else {
            self.ctx.kv("Registrar API:", "disabled");
        }
    }

    /// Render the env file with values as stored.
    pub fn render_env(&self, env: &EnvironmentConfig) {
        for key in env.keys() {
            let value = env.get(key).unwrap_or_default();
            println!("{key}={value}");
        }
    }

    pub fn render_dns_report(&self, report: &DnsReport) {
        self.ctx.kv("Public IP:", &report.public_ip.to_string());
        for check in &report.checks {
            match &check.outcome {
                RecordOutcome::Matches => self
                    .ctx
                    .success(&format!("{} points at this machine", check.name)),
                RecordOutcome::Updated => self
                    .ctx
                    .success(&format!("{} updated at the registrar", check.name)),
                RecordOutcome::Declined => self
                    .ctx
                    .warn(&format!("{} left unchanged at your request", check.name)),
                RecordOutcome::ManualActionRequired => self.ctx.warn(&format!(
                    "{}: set an A record for host '{}' to {}",
                    check.name, check.host, report.public_ip
                )),
                RecordOutcome::Failed(reason) => self
                    .ctx
                    .error(&format!("{}: {reason}", check.name)),
            }
        }
    }
}
