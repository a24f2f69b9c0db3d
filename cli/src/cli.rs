//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::infra::config::YamlConfigStore;

/// Provision and supervise a containerized gateway node
#[derive(Parser)]
#[command(
    name = "gatewayctl",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Answer yes to every prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download and install Docker
    InstallRuntime,

    /// Start the gateway containers
    Start,

    /// Stop the gateway containers
    Stop,

    /// View or edit the node's environment file
    #[command(subcommand)]
    Env(commands::env::EnvCommand),

    /// Manage the gateway's domain and DNS records
    #[command(subcommand)]
    Domain(commands::domain::DomainCommand),

    /// Deploy the TLS reverse proxy for the saved domain
    DeployProxy,

    /// Install the observer wallet from a JWK file
    LoadWallet(commands::LoadWalletArgs),

    /// Sync the compose manifest and resolve updates
    #[command(subcommand)]
    Manifest(commands::manifest::ManifestCommand),

    /// Open the gateway ports on the firewall and router
    OpenPorts,

    /// Show runtime, manifest, domain and container status
    Status,

    /// Run the JSON-lines channel for the desktop front-end
    Serve,

    /// Show version
    Version,

    #[command(hide = true, name = "_acme-auth-hook")]
    AcmeAuthHook,

    #[command(hide = true, name = "_acme-cleanup-hook")]
    AcmeCleanupHook,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            verbose,
            command,
        } = self;
        crate::logging::init(verbose);

        // Commands that need no node context.
        match command {
            Command::Version => return commands::version::run(json).map(|()| ExitCode::SUCCESS),
            Command::AcmeAuthHook => return commands::internal::acme_auth_hook().await,
            Command::AcmeCleanupHook => return Ok(commands::internal::acme_cleanup_hook().await),
            _ => {}
        }

        let flags = AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        };
        let app = AppContext::new(&flags, &YamlConfigStore)?;

        match command {
            Command::InstallRuntime => commands::install::run(&app).await,
            Command::Start => commands::start::run(&app).await,
            Command::Stop => commands::stop::run(&app).await,
            Command::Env(cmd) => commands::env::run(&app, cmd).await,
            Command::Domain(cmd) => commands::domain::run(&app, cmd).await,
            Command::DeployProxy => commands::proxy::run(&app).await,
            Command::LoadWallet(args) => commands::wallet::run(&app, &args),
            Command::Manifest(cmd) => commands::manifest::run(&app, cmd).await,
            Command::OpenPorts => commands::network::run(&app).await,
            Command::Status => commands::status::run(&app).await,
            Command::Serve => commands::serve::run(&app).await,
            Command::Version | Command::AcmeAuthHook | Command::AcmeCleanupHook => {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
