//! `gatewayctl env`: view and edit the node's environment file.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;
use gateway_common::EnvVar;

use crate::app::AppContext;
use crate::application::services::env;
use crate::domain::env_file::EnvironmentConfig;
use crate::infra::fs::LocalFs;

#[derive(Subcommand)]
pub enum EnvCommand {
    /// Set variables and restart the gateway
    Set {
        /// Assignments as KEY=VALUE
        #[arg(required = true, value_parser = parse_assignment)]
        vars: Vec<EnvVar>,
    },
    /// Print the environment file
    Show,
}

/// Run `gatewayctl env`.
///
/// # Errors
///
/// Returns an error if the env file cannot be read or the production
/// capabilities cannot be built.
pub async fn run(app: &AppContext, cmd: EnvCommand) -> Result<ExitCode> {
    match cmd {
        EnvCommand::Set { vars } => {
            let sink = app.sink();
            let orchestrator = app.orchestrator(&sink)?;
            let ok = orchestrator.save_env(&vars).await;
            super::finish(app, "env set", ok)
        }
        EnvCommand::Show => {
            let current = env::load_env(&LocalFs, &app.paths)?;
            app.renderer().render_env(&current)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Parse `KEY=VALUE`. The value may be empty or contain `=`.
fn parse_assignment(s: &str) -> Result<EnvVar, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if !EnvironmentConfig::is_valid_key(key) {
        return Err(format!("'{key}' is not a valid variable name"));
    }
    Ok(EnvVar {
        key: key.to_string(),
        value: value.to_string(),
    })
}
