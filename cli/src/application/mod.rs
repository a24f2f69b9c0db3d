//! Application layer: port traits and use-case services.
//!
//! This module depends only on `crate::domain` and the shared wire types,
//! never on `crate::infra`, `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{
    ArtifactWriter, Capabilities, CommandRunner, ConfigStore, Confirmer, DnsResolver, Downloader,
    EventSink, FileHasher, Firewall, LocalFs, PortMapper, PublicAddress, RegistrarApi,
    RuntimeHost,
};
pub use services::orchestrator::{GatewayStatus, Orchestrator};
