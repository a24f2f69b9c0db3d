//! Router port forwarding through the miniupnpc `upnpc` client.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::Duration;

use tracing::debug;

use crate::application::ports::{CommandRunner, PortMapper};
use crate::domain::network::{MappingError, PortMapping};

/// Gateway discovery plus the SOAP round-trip.
const UPNPC_TIMEOUT: Duration = Duration::from_secs(20);

/// Routers report an existing mapping as UPnP error 718.
const CONFLICT_MARKERS: &[&str] = &["ConflictInMappingEntry", "code 718"];

pub struct UpnpcMapper<R> {
    runner: R,
}

impl<R: CommandRunner> UpnpcMapper<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> PortMapper for UpnpcMapper<R> {
    async fn add_mapping(&self, mapping: &PortMapping) -> Result<(), MappingError> {
        let local = local_ipv4().ok_or_else(|| {
            MappingError::Other("cannot determine this machine's LAN address".to_string())
        })?;
        let local = local.to_string();
        let internal = mapping.internal.to_string();
        let external = mapping.external.to_string();
        let protocol = mapping.protocol.to_string();
        let ttl = mapping.ttl_secs.to_string();
        let args = [
            "-e",
            mapping.description.as_str(),
            "-a",
            local.as_str(),
            internal.as_str(),
            external.as_str(),
            protocol.as_str(),
            ttl.as_str(),
        ];
        let out = self
            .runner
            .run_with_timeout("upnpc", &args, UPNPC_TIMEOUT)
            .await
            .map_err(|e| MappingError::Other(format!("{e:#}")))?;
        let text = format!(
            "{}\n{}",
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr)
        );
        debug!(port = mapping.external, output = %text.trim(), "upnpc");
        interpret(out.status.success(), &text)
    }
}

/// `upnpc` exits zero even when the router refuses, so the output decides.
fn interpret(exit_ok: bool, output: &str) -> Result<(), MappingError> {
    if CONFLICT_MARKERS.iter().any(|m| output.contains(m)) {
        return Err(MappingError::AlreadyExists);
    }
    if exit_ok && output.contains("is redirected to") {
        return Ok(());
    }
    let reason = output
        .lines()
        .map(str::trim)
        .find(|l| l.contains("failed") || l.starts_with("No IGD"))
        .unwrap_or("router did not confirm the mapping");
    Err(MappingError::Other(reason.to_string()))
}

/// The address the OS would use to reach the internet. Connecting a UDP
/// socket sends nothing.
fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
