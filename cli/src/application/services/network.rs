//! Inbound reachability: host firewall rules and router port mappings.
//!
//! Failures here never stop the gateway; they are logged and, for the
//! router, turned into a manual-forwarding advisory.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::application::ports::{EventSink, Firewall, PortMapper};
use crate::domain::network::{self as net, MappingError, PortMapping};

/// Make sure an inbound allow rule exists for each port. Errors are logged
/// and do not stop the remaining ports.
pub async fn ensure_firewall_ports(firewall: &impl Firewall, ports: &[u16], description: &str) {
    for &port in ports {
        match firewall.has_rule(port).await {
            Ok(true) => debug!(port, "firewall rule present"),
            Ok(false) => match firewall.allow_port(port, description).await {
                Ok(()) => info!(port, "firewall rule added"),
                Err(e) => warn!(port, error = %e, "could not add firewall rule"),
            },
            Err(e) => warn!(port, error = %e, "could not query firewall rules"),
        }
    }
}

/// Lease each mapping on the router once. Returns the external ports that
/// could not be mapped. An existing mapping counts as success.
pub async fn forward_ports(mapper: &impl PortMapper, mappings: &[PortMapping]) -> BTreeSet<u16> {
    let mut failed = BTreeSet::new();
    for mapping in mappings {
        match mapper.add_mapping(mapping).await {
            Ok(()) => info!(port = mapping.external, "port mapping leased"),
            Err(MappingError::AlreadyExists) => {
                debug!(port = mapping.external, "port mapping already exists");
            }
            Err(MappingError::Other(reason)) => {
                warn!(port = mapping.external, %reason, "port mapping failed");
                failed.insert(mapping.external);
            }
        }
    }
    failed
}

/// Firewall first, then router. Emits the manual-forwarding advisory when
/// any mapping failed and returns the failed ports.
pub async fn provision(
    firewall: &impl Firewall,
    mapper: &impl PortMapper,
    ports: &[u16],
    description: &str,
    sink: &impl EventSink,
) -> BTreeSet<u16> {
    ensure_firewall_ports(firewall, ports, description).await;
    let failed = forward_ports(mapper, &net::gateway_mappings(ports, description)).await;
    if let Some(advisory) = net::manual_forwarding_advisory(&failed) {
        sink.warn(&advisory);
    }
    failed
}
