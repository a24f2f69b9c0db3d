//! Domain persistence and A-record reconciliation.
//!
//! Registrar mutations are always read-modify-write over the full record
//! set and never happen without operator consent.

use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::{Context, Result};
use gateway_common::DomainConfig;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::ports::{
    Confirmer, DnsResolver, EventSink, LocalFs, PublicAddress, RegistrarApi,
};
use crate::application::services::artifacts::write_atomic;
use crate::domain::challenge::RegistrarCredentials;
use crate::domain::config::GatewayPaths;
use crate::domain::error::GatewayError;
use crate::domain::registrar::{self, HostRecord, RegisteredDomain};

/// Bound on each A-record lookup.
pub const DNS_TIMEOUT: Duration = Duration::from_secs(5);

// ── Persistence ──────────────────────────────────────────────────────────────

/// The saved domain, if any.
///
/// # Errors
///
/// Returns an error if the file exists but is unreadable or not valid JSON.
pub fn load_domain(fs: &impl LocalFs, paths: &GatewayPaths) -> Result<Option<DomainConfig>> {
    let path = paths.domain_file();
    if !fs.exists(&path) {
        return Ok(None);
    }
    let text = fs.read_to_string(&path).context("reading domain file")?;
    let domain: DomainConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(domain))
}

/// Normalise, validate and atomically persist a domain. Returns what was
/// stored.
///
/// # Errors
///
/// Returns the validation error, or an error if the write fails.
pub fn save_domain(
    fs: &impl LocalFs,
    paths: &GatewayPaths,
    domain: DomainConfig,
) -> Result<DomainConfig> {
    let domain = domain.normalized();
    domain.validate()?;
    let json = serde_json::to_string_pretty(&domain).context("serializing domain")?;
    write_atomic(fs, &paths.domain_file(), &json).context("writing domain file")?;
    info!(fqdn = %domain.fqdn, registrar = domain.use_registrar_api, "domain saved");
    Ok(domain)
}

// ── Registrar read-modify-write ──────────────────────────────────────────────

/// Replace or append `record` in the domain's record set.
///
/// # Errors
///
/// Returns registrar transport or API errors.
pub async fn upsert_record(
    api: &impl RegistrarApi,
    creds: &RegistrarCredentials,
    domain: &RegisteredDomain,
    record: HostRecord,
) -> Result<()> {
    let current = api.get_hosts(creds, domain).await.context("registrar getHosts")?;
    debug!(domain = %domain.name(), records = current.len(), "fetched host records");
    let updated = registrar::upsert(current, record);
    api.set_hosts(creds, domain, &updated)
        .await
        .context("registrar setHosts")
}

/// Remove every record with `name` and `record_type`. Returns whether
/// anything was removed; nothing is written when nothing matched.
///
/// # Errors
///
/// Returns registrar transport or API errors.
pub async fn remove_record(
    api: &impl RegistrarApi,
    creds: &RegistrarCredentials,
    domain: &RegisteredDomain,
    name: &str,
    record_type: &str,
) -> Result<bool> {
    let current = api.get_hosts(creds, domain).await.context("registrar getHosts")?;
    let Some(updated) = registrar::remove(&current, name, record_type) else {
        return Ok(false);
    };
    api.set_hosts(creds, domain, &updated)
        .await
        .context("registrar setHosts")?;
    Ok(true)
}

// ── Reconciliation ───────────────────────────────────────────────────────────

/// What happened to one checked name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Already points at this machine.
    Matches,
    /// Updated through the registrar after consent.
    Updated,
    /// The operator said no.
    Declined,
    /// No registrar credentials; the operator was told what to change.
    ManualActionRequired,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCheck {
    /// Name that was resolved.
    pub name: String,
    /// Registrar host label that would be updated.
    pub host: String,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsReport {
    pub public_ip: Ipv4Addr,
    pub checks: Vec<RecordCheck>,
}

/// Capabilities used by [`check_and_reconcile`].
pub struct DnsContext<'a, R, P, A, C, S> {
    pub resolver: &'a R,
    pub public: &'a P,
    pub registrar: &'a A,
    pub confirmer: &'a C,
    pub sink: &'a S,
}

/// Check that the bare domain and `<probe>.<domain>` resolve to this
/// machine's public address, offering to fix each through the registrar.
///
/// Both names are handled concurrently and independently. Registrar writes
/// are serialised so the two updates cannot overwrite each other.
///
/// # Errors
///
/// Returns an error only if the public address or the registered domain
/// cannot be determined; per-name failures are reported in the result.
pub async fn check_and_reconcile<R, P, A, C, S>(
    ctx: &DnsContext<'_, R, P, A, C, S>,
    domain: &DomainConfig,
    probe_subdomain: &str,
) -> Result<DnsReport>
where
    R: DnsResolver,
    P: PublicAddress,
    A: RegistrarApi,
    C: Confirmer,
    S: EventSink,
{
    let public_ip = ctx
        .public
        .public_ipv4()
        .await
        .map_err(|e| GatewayError::transport("public address lookup", format!("{e:#}")))?;
    let registered = RegisteredDomain::from_fqdn(&domain.fqdn)?;
    let creds = domain.credentials().map(|(user, key)| RegistrarCredentials {
        api_user: user.to_string(),
        api_key: key.to_string(),
        client_ip: public_ip,
    });

    let apex_host = registered.relative_host(&domain.fqdn);
    let wildcard_host = match apex_host.as_str() {
        "@" => "*".to_string(),
        sub => format!("*.{sub}"),
    };
    let probe_name = format!("{probe_subdomain}.{}", domain.fqdn);

    let write_lock = Mutex::new(());
    let target = Target {
        public_ip,
        registered: &registered,
        creds: creds.as_ref(),
        write_lock: &write_lock,
    };
    let (apex, wildcard) = tokio::join!(
        reconcile_name(ctx, &target, &domain.fqdn, &apex_host),
        reconcile_name(ctx, &target, &probe_name, &wildcard_host),
    );
    Ok(DnsReport {
        public_ip,
        checks: vec![apex, wildcard],
    })
}

struct Target<'a> {
    public_ip: Ipv4Addr,
    registered: &'a RegisteredDomain,
    creds: Option<&'a RegistrarCredentials>,
    write_lock: &'a Mutex<()>,
}

async fn reconcile_name<R, P, A, C, S>(
    ctx: &DnsContext<'_, R, P, A, C, S>,
    target: &Target<'_>,
    name: &str,
    host: &str,
) -> RecordCheck
where
    R: DnsResolver,
    A: RegistrarApi,
    C: Confirmer,
    S: EventSink,
{
    let check = |outcome| RecordCheck {
        name: name.to_string(),
        host: host.to_string(),
        outcome,
    };
    let ip = target.public_ip;

    let problem = match tokio::time::timeout(DNS_TIMEOUT, ctx.resolver.resolve_a(name)).await {
        Ok(Ok(addrs)) if addrs.contains(&ip) => {
            ctx.sink.info(&format!("{name} points to this machine ({ip})."));
            return check(RecordOutcome::Matches);
        }
        Ok(Ok(addrs)) if addrs.is_empty() => format!("{name} has no A record"),
        Ok(Ok(addrs)) => format!(
            "{name} points to {}",
            addrs
                .iter()
                .map(Ipv4Addr::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Ok(Err(e)) => format!("{name} could not be resolved ({e:#})"),
        Err(_) => format!("{name} did not resolve within {}s", DNS_TIMEOUT.as_secs()),
    };
    warn!(%name, %problem, "A record does not match public address");

    let Some(creds) = target.creds else {
        ctx.sink.warn(&format!(
            "{problem}. Create an A record for host '{host}' on {} pointing to {ip}.",
            target.registered.name()
        ));
        return check(RecordOutcome::ManualActionRequired);
    };

    let message =
        format!("{problem}, expected {ip}. Update the A record for host '{host}' to {ip}?");
    match ctx.confirmer.confirm("Update DNS record", &message).await {
        Ok(true) => {}
        Ok(false) => {
            ctx.sink.info(&format!("Left the A record for {name} unchanged."));
            return check(RecordOutcome::Declined);
        }
        Err(e) => {
            ctx.sink.error(&format!("No answer for {name}: {e:#}"));
            return check(RecordOutcome::Failed(format!("{e:#}")));
        }
    }

    let _guard = target.write_lock.lock().await;
    match upsert_record(ctx.registrar, creds, target.registered, HostRecord::a(host, ip)).await {
        Ok(()) => {
            ctx.sink.info(&format!("A record for {name} now points to {ip}."));
            check(RecordOutcome::Updated)
        }
        Err(e) => {
            ctx.sink.error(&format!("Failed to update the A record for {name}: {e:#}"));
            check(RecordOutcome::Failed(format!("{e:#}")))
        }
    }
}
