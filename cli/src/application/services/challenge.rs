//! DNS-01 challenge hooks: publish the token, wait for it to propagate,
//! clean it up afterwards.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::application::ports::{DnsResolver, RegistrarApi};
use crate::application::services::dns::{remove_record, upsert_record};
use crate::domain::challenge::{self, HookRequest, PollSchedule};
use crate::domain::error::ChallengeError;
use crate::domain::registrar::{HostRecord, RegisteredDomain};

/// Poll until `name` carries `expected`. Sleeps `settle` first, then looks
/// up at most `max_attempts` times with `interval` between lookups.
/// Returns the attempt that saw the record.
///
/// # Errors
///
/// `PropagationTimeout` after the last attempt.
pub async fn wait_for_txt(
    resolver: &impl DnsResolver,
    name: &str,
    expected: &str,
    schedule: PollSchedule,
) -> Result<u32, ChallengeError> {
    tokio::time::sleep(schedule.settle).await;
    for attempt in 1..=schedule.max_attempts {
        match resolver.lookup_txt(name).await {
            Ok(values) if challenge::txt_matches(&values, expected) => {
                info!(%name, attempt, "challenge record visible");
                return Ok(attempt);
            }
            Ok(values) => debug!(%name, attempt, ?values, "challenge record not visible yet"),
            Err(e) => debug!(%name, attempt, error = %e, "TXT lookup failed"),
        }
        if attempt < schedule.max_attempts {
            tokio::time::sleep(schedule.interval).await;
        }
    }
    Err(ChallengeError::PropagationTimeout {
        name: name.to_string(),
        attempts: schedule.max_attempts,
    })
}

/// Publish the validation token and block until it is visible.
///
/// # Errors
///
/// Returns registrar errors, or `PropagationTimeout`.
pub async fn auth_hook(
    api: &impl RegistrarApi,
    resolver: &impl DnsResolver,
    req: &HookRequest,
    schedule: PollSchedule,
) -> Result<u32> {
    let registered = RegisteredDomain::from_fqdn(&req.domain)?;
    let host = registered.challenge_host(&req.domain);
    info!(domain = %req.domain, %host, "publishing challenge record");
    upsert_record(
        api,
        &req.credentials,
        &registered,
        HostRecord::txt(&host, &req.validation),
    )
    .await?;
    Ok(wait_for_txt(resolver, &req.record_name(), &req.validation, schedule).await?)
}

/// Remove the challenge record. Returns whether one was present.
///
/// # Errors
///
/// Returns registrar errors; callers treat them as non-fatal.
pub async fn cleanup_hook(api: &impl RegistrarApi, req: &HookRequest) -> Result<bool> {
    let registered = RegisteredDomain::from_fqdn(&req.domain)?;
    let host = registered.challenge_host(&req.domain);
    let removed = remove_record(api, &req.credentials, &registered, &host, "TXT").await?;
    if removed {
        info!(%host, "challenge record removed");
    } else {
        warn!(%host, "no challenge record to remove");
    }
    Ok(removed)
}
