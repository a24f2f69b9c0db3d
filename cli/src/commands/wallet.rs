//! `gatewayctl load-wallet`: install the observer wallet.

use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use crate::app::AppContext;
use crate::commands::LoadWalletArgs;
use crate::output::JsonRenderer;

/// Run `gatewayctl load-wallet <path>`.
///
/// # Errors
///
/// Returns an error if the production capabilities cannot be built.
pub fn run(app: &AppContext, args: &LoadWalletArgs) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    let Some(wallet) = orchestrator.load_wallet(&args.path) else {
        return super::finish(app, "load-wallet", false);
    };
    if app.is_json() {
        JsonRenderer::print(&json!({ "address": wallet.address }))?;
    } else if !app.output.quiet {
        app.output.kv("Observer wallet:", &wallet.address);
        app.output.info("Restart the gateway to use it: gatewayctl stop && gatewayctl start");
    }
    Ok(ExitCode::SUCCESS)
}
