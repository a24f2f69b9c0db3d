//! `gatewayctl status`: runtime, manifest, domain and containers.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run `gatewayctl status`. Never starts the daemon or touches the node.
///
/// # Errors
///
/// Returns an error if rendering fails or the production capabilities
/// cannot be built.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    let status = orchestrator.status().await;
    if !app.is_json() && !app.output.quiet {
        app.output.kv("Node directory:", &app.paths.root().display().to_string());
        app.output.kv("Config file:", &app.config_path.display().to_string());
    }
    app.renderer().render_status(&status)?;
    Ok(ExitCode::SUCCESS)
}
