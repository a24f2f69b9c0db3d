//! Command implementations

pub mod domain;
pub mod env;
pub mod install;
pub mod internal;
pub mod manifest;
pub mod network;
pub mod proxy;
pub mod serve;
pub mod start;
pub mod status;
pub mod stop;
pub mod version;
pub mod wallet;

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::output::JsonRenderer;

/// Arguments for the load-wallet command.
#[derive(Args)]
pub struct LoadWalletArgs {
    /// JWK wallet file (JSON)
    pub path: std::path::PathBuf,
}

/// Map a lifecycle result to an exit code, printing the JSON result object
/// in `--json` mode. Failures were already reported through the sink.
fn finish(app: &AppContext, command: &str, ok: bool) -> Result<ExitCode> {
    if app.is_json() {
        JsonRenderer::print(&JsonRenderer::outcome(command, ok))?;
    }
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
