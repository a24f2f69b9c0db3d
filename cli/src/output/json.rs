//! JSON output helpers.
//!
//! Every one-shot `--json` command prints a single pretty-printed object
//! on stdout; failures use the error object from [`format_error`].

use anyhow::{Context, Result};
use gateway_common::DomainConfig;
use serde_json::{Value, json};

use crate::application::services::dns::{DnsReport, RecordOutcome};
use crate::application::services::orchestrator::GatewayStatus;
use crate::domain::env_file::EnvironmentConfig;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Builds JSON documents for command results.
pub struct JsonRenderer;

impl JsonRenderer {
    #[must_use]
    pub fn status(status: &GatewayStatus) -> Value {
        let containers = status.containers.as_ref().map(|snapshot| {
            snapshot
                .containers
                .iter()
                .map(|c| json!({ "name": c.name, "status": c.status, "running": c.is_running() }))
                .collect::<Vec<_>>()
        });
        json!({
            "runtime": {
                "installed": status.runtime.installed,
                "daemon_running": status.runtime.daemon_running,
            },
            "manifest": {
                "sha256": status.manifest_digest,
                "pending_update": status.pending_manifest,
            },
            "network": status.network,
            "containers": containers,
            "domain": status.domain,
            "hook_binary": status.hook_binary,
        })
    }

    #[must_use]
    pub fn domain(domain: Option<&DomainConfig>) -> Value {
        json!({ "domain": domain })
    }

    #[must_use]
    pub fn env(env: &EnvironmentConfig) -> Value {
        let vars: serde_json::Map<String, Value> = env
            .keys()
            .map(|k| (k.to_string(), json!(env.get(k).unwrap_or_default())))
            .collect();
        Value::Object(vars)
    }

    #[must_use]
    pub fn dns_report(report: &DnsReport) -> Value {
        let checks: Vec<Value> = report
            .checks
            .iter()
            .map(|c| {
                let (outcome, reason) = match &c.outcome {
                    RecordOutcome::Matches => ("matches", None),
                    RecordOutcome::Updated => ("updated", None),
                    RecordOutcome::Declined => ("declined", None),
                    RecordOutcome::ManualActionRequired => ("manual_action_required", None),
                    RecordOutcome::Failed(r) => ("failed", Some(r.as_str())),
                };
                json!({ "name": c.name, "host": c.host, "outcome": outcome, "reason": reason })
            })
            .collect();
        json!({ "public_ip": report.public_ip.to_string(), "checks": checks })
    }

    /// Result of a lifecycle command.
    #[must_use]
    pub fn outcome(command: &str, ok: bool) -> Value {
        json!({ "command": command, "ok": ok })
    }

    /// Print `value` pretty-printed on stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn print(value: &Value) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }
}
