//! Domain layer: pure types, parsing and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, or `std::fs`, and never spawns processes
//! or opens sockets. All functions are synchronous and take data in,
//! returning data out.

pub mod artifact;
pub mod challenge;
pub mod config;
pub mod containers;
pub mod env_file;
pub mod error;
pub mod manifest;
pub mod network;
pub mod proxy;
pub mod registrar;
pub mod runtime;
pub mod wallet;

pub use artifact::{Artifact, WriteOutcome};
pub use config::{GatewayConfig, GatewayPaths};
pub use containers::ContainerSnapshot;
pub use env_file::EnvironmentConfig;
pub use error::{ErrorKind, GatewayError, ManifestError, ProxyError, RuntimeError};
pub use manifest::SyncOutcome;
pub use runtime::RuntimeState;
