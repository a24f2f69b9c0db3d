//! `gatewayctl deploy-proxy`: TLS reverse proxy with wildcard certificates.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run `gatewayctl deploy-proxy`.
///
/// # Errors
///
/// Returns an error if the production capabilities cannot be built.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    sink.begin("Deploying the TLS proxy (certificate issuance can take 10+ minutes)...");
    let ok = orchestrator.deploy_proxy().await;
    sink.finish(
        ok,
        if ok {
            "TLS proxy is running."
        } else {
            "TLS proxy was not deployed."
        },
    );
    super::finish(app, "deploy-proxy", ok)
}
