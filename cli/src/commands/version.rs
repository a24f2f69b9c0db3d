//! Version command

use crate::output::JsonRenderer;

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(json: bool) -> anyhow::Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    if json {
        JsonRenderer::print(&serde_json::json!({ "version": version }))
    } else {
        println!("gatewayctl {version}");
        Ok(())
    }
}
