//! `gatewayctl domain`: the gateway's public domain and its DNS records.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use gateway_common::DomainConfig;

use crate::app::AppContext;

#[derive(Subcommand)]
pub enum DomainCommand {
    /// Save the domain and check its DNS records
    Set(SetArgs),
    /// Show the saved domain (API key masked)
    Show,
    /// Compare the domain's A records with this machine's public address
    Check,
}

#[derive(Args)]
pub struct SetArgs {
    /// Fully qualified domain, e.g. gateway.example.com
    pub fqdn: String,

    /// Registrar API user. Enables automatic DNS record updates.
    #[arg(long, requires = "api_key")]
    pub api_user: Option<String>,

    /// Registrar API key
    #[arg(long, env = "GATEWAY_API_KEY", hide_env_values = true, requires = "api_user")]
    pub api_key: Option<String>,
}

impl SetArgs {
    fn into_config(self) -> DomainConfig {
        DomainConfig {
            fqdn: self.fqdn,
            use_registrar_api: self.api_user.is_some(),
            api_user: self.api_user,
            api_key: self.api_key,
        }
    }
}

/// Run `gatewayctl domain`.
///
/// # Errors
///
/// Returns an error if rendering fails or the production capabilities
/// cannot be built.
pub async fn run(app: &AppContext, cmd: DomainCommand) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    match cmd {
        DomainCommand::Set(args) => {
            let Some(saved) = orchestrator.save_domain(args.into_config()).await else {
                return super::finish(app, "domain set", false);
            };
            app.renderer().render_domain(Some(&saved.redacted()))?;
            Ok(ExitCode::SUCCESS)
        }
        DomainCommand::Show => {
            let domain = orchestrator.load_domain().map(|d| d.redacted());
            app.renderer().render_domain(domain.as_ref())?;
            Ok(ExitCode::SUCCESS)
        }
        DomainCommand::Check => {
            let Some(domain) = orchestrator.load_domain() else {
                app.output.error("No domain saved. Run: gatewayctl domain set <fqdn>");
                return super::finish(app, "domain check", false);
            };
            let Some(report) = orchestrator.check_domain(&domain).await else {
                return super::finish(app, "domain check", false);
            };
            app.renderer().render_dns_report(&report)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
