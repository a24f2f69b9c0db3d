//! `gatewayctl open-ports`: firewall rules and router port forwarding.

use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use crate::app::AppContext;
use crate::output::JsonRenderer;

/// Run `gatewayctl open-ports`.
///
/// Ports the router would not forward are not an error; they are listed
/// for the operator to forward by hand.
///
/// # Errors
///
/// Returns an error if the production capabilities cannot be built.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    let manual = orchestrator.provision_network().await;
    if app.is_json() {
        JsonRenderer::print(&json!({
            "ports": app.config.gateway_ports,
            "manual_forwarding": manual,
        }))?;
    } else if manual.is_empty() {
        app.output.success("All gateway ports are open and forwarded.");
    }
    Ok(ExitCode::SUCCESS)
}
