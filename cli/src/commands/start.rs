//! `gatewayctl start`: bring the gateway's container group up.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::output::OutputContext;

/// Run `gatewayctl start`.
///
/// A node that has never been prepared (no env file or no manifest) runs
/// the full startup sequence first.
///
/// # Errors
///
/// Returns an error if the production capabilities cannot be built.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    let prepared = app.paths.env_file().exists() && app.paths.manifest().exists();
    if !prepared && !orchestrator.startup().await {
        return super::finish(app, "start", false);
    }

    let ok = orchestrator.start().await;
    if ok && !app.is_json() {
        print_next_steps(&app.output);
    }
    super::finish(app, "start", ok)
}

fn print_next_steps(ctx: &OutputContext) {
    if ctx.quiet {
        return;
    }
    ctx.kv("Status", "gatewayctl status");
    ctx.kv("Stop", "gatewayctl stop");
}
