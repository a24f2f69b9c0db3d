//! `gatewayctl manifest`: sync the compose manifest and resolve updates.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::{AppContext, CliOrchestrator};
use crate::application::ports::EventSink;

#[derive(Subcommand)]
pub enum ManifestCommand {
    /// Download the published manifest; asks before replacing a changed one
    Sync,
    /// Replace the local manifest with the pending update
    Apply,
    /// Delete the pending update and keep the local manifest
    Discard,
}

/// Run `gatewayctl manifest`.
///
/// # Errors
///
/// Returns an error if the production capabilities cannot be built.
pub async fn run(app: &AppContext, cmd: ManifestCommand) -> Result<ExitCode> {
    let sink = app.sink();
    let orchestrator = app.orchestrator(&sink)?;

    let (name, ok) = match cmd {
        ManifestCommand::Sync => ("manifest sync", orchestrator.prepare_environment().await),
        ManifestCommand::Apply => (
            "manifest apply",
            apply_or_discard(app, &orchestrator, &sink, true),
        ),
        ManifestCommand::Discard => (
            "manifest discard",
            apply_or_discard(app, &orchestrator, &sink, false),
        ),
    };
    super::finish(app, name, ok)
}

fn apply_or_discard<S: EventSink>(
    app: &AppContext,
    orchestrator: &CliOrchestrator<'_, S>,
    sink: &impl EventSink,
    accepted: bool,
) -> bool {
    if !app.paths.pending_manifest().exists() {
        sink.info("No manifest update is pending.");
        return true;
    }
    orchestrator.confirm_manifest(accepted, None)
}
