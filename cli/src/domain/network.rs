//! Router port mappings and the manual-forwarding advisory.

use std::collections::BTreeSet;
use std::fmt;

/// Lease length requested from the router.
pub const MAPPING_TTL_SECS: u32 = 3600;

pub const PORT_FORWARDING_HELP_URL: &str = "https://portforward.com/router.htm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        })
    }
}

/// A lease-based forwarding request for one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub external: u16,
    pub internal: u16,
    pub protocol: Protocol,
    pub description: String,
    pub ttl_secs: u32,
}

impl PortMapping {
    #[must_use]
    pub fn tcp(port: u16, description: &str) -> Self {
        Self {
            external: port,
            internal: port,
            protocol: Protocol::Tcp,
            description: description.to_string(),
            ttl_secs: MAPPING_TTL_SECS,
        }
    }
}

/// Why the router refused a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The router already forwards this port. Treated as success.
    AlreadyExists,
    Other(String),
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => f.write_str("mapping already exists"),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

/// One TCP mapping per gateway port, same port inside and out.
#[must_use]
pub fn gateway_mappings(ports: &[u16], description: &str) -> Vec<PortMapping> {
    ports.iter().map(|&p| PortMapping::tcp(p, description)).collect()
}

/// Warning shown when the router did not accept every mapping.
#[must_use]
pub fn manual_forwarding_advisory(failed: &BTreeSet<u16>) -> Option<String> {
    if failed.is_empty() {
        return None;
    }
    let ports = failed
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "Automatic port forwarding failed for port(s) {ports}. \
         Forward them to this machine manually in your router settings: {PORT_FORWARDING_HELP_URL}"
    ))
}
