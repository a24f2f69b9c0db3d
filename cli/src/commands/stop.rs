//! `gatewayctl stop`: stop the container group, preserving its data.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run `gatewayctl stop`.
///
/// # Errors
///
/// Returns an error if the production capabilities cannot be built.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    let ok = orchestrator.stop().await;
    if ok && !app.is_json() && !app.output.quiet {
        app.output.kv("Resume", "gatewayctl start");
    }
    super::finish(app, "stop", ok)
}
