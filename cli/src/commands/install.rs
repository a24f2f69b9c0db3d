//! `gatewayctl install-runtime`: download and run the Docker installer.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run `gatewayctl install-runtime`.
///
/// # Errors
///
/// Returns an error if the production capabilities cannot be built.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    sink.begin("Installing Docker (this can take several minutes)...");
    let ok = orchestrator.install_runtime().await;
    sink.finish(
        ok,
        if ok {
            "Docker is installed and running."
        } else {
            "Docker installation did not complete."
        },
    );

    super::finish(app, "install-runtime", ok)
}
