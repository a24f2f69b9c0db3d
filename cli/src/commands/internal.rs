//! Internal commands (`_acme-auth-hook`, `_acme-cleanup-hook`).
//!
//! These are invoked by the certificate tool inside the proxy container,
//! not by users. The challenge arrives in `CERTBOT_*` variables and the
//! registrar credentials in `GATEWAY_*` variables.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::warn;

use crate::application::services::challenge;
use crate::domain::challenge::{HookRequest, PollSchedule};
use crate::infra::system::hook_adapters;

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Publish the DNS-01 token and wait until public resolvers see it.
///
/// # Errors
///
/// Returns an error if a variable is missing, the registrar rejects the
/// update, or the record never becomes visible. The certificate tool
/// aborts the order on a non-zero exit.
pub async fn acme_auth_hook() -> Result<ExitCode> {
    let req = HookRequest::from_env(env_lookup, true)?;
    let (api, resolver) = hook_adapters()?;

    let attempt = challenge::auth_hook(&api, &resolver, &req, PollSchedule::default())
        .await
        .with_context(|| format!("DNS-01 challenge for {}", req.domain))?;
    eprintln!(
        "{} is visible after {attempt} lookup(s)",
        req.record_name()
    );
    Ok(ExitCode::SUCCESS)
}

/// Remove the DNS-01 token. Best-effort: always exits 0 so a failed
/// cleanup never fails an issued certificate.
pub async fn acme_cleanup_hook() -> ExitCode {
    let req = match HookRequest::from_env(env_lookup, false) {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "cleanup hook skipped");
            return ExitCode::SUCCESS;
        }
    };
    let api = match hook_adapters() {
        Ok((api, _)) => api,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "cleanup hook skipped");
            return ExitCode::SUCCESS;
        }
    };
    if let Err(e) = challenge::cleanup_hook(&api, &req).await {
        warn!(domain = %req.domain, error = %format!("{e:#}"), "challenge cleanup failed");
    }
    ExitCode::SUCCESS
}
